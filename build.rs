use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

const GROUND_TEXTURES: [&str; 3] = [
    "textures/grid.png",
    "textures/ground-ao.png",
    "textures/alpha-map.png",
];

fn main() -> Result<()> {
    // This tells Cargo to rerun this script if something in /assets/ changes.
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        return Ok(());
    }

    for texture in GROUND_TEXTURES {
        if !assets_src.join(texture).exists() {
            println!("cargo:warning=assets/{} is missing, the ground will fail to mount", texture);
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    let paths_to_copy = vec![assets_src];
    copy_items(&paths_to_copy, out_dir, &copy_options)?;

    Ok(())
}
