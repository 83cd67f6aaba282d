//! Opens a window showing the ground.
//!
//! Textures are read from `FLOW_ASSET_ROOT` (default `./assets`), which must
//! contain `textures/grid.png`, `textures/ground-ao.png` and
//! `textures/alpha-map.png`.

fn main() -> anyhow::Result<()> {
    flow_ground::flow::run(vec![flow_ground::ground::constructor()])
}
