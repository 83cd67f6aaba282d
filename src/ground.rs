//! The ground: a faint grid overlay on top of a reflective circular floor,
//! backed by a flat static collider.
//!
//! Everything about the ground is fixed at compile time. Mounting loads the
//! three textures concurrently, registers the collider and runs two one-shot
//! effects: anisotropic filtering on the grid texture and a `uv2` set that
//! aliases each mesh's `uv` buffer (the ambient occlusion map reads `uv2`).

use std::f32::consts::FRAC_PI_2;

use anyhow::Context as _;
use instant::Duration;
use log::{debug, info, warn};
use rapier3d::prelude::RigidBodyType;

use crate::{
    context::{Context, InitContext, RenderResources},
    data_structures::{
        geometry::{self, BufferAttribute, Geometry},
        instance::Instance,
        material::{BasicMaterial, Color, Material, ReflectorMaterial},
        mesh::{MeshDescriptor, MeshNode},
    },
    flow::{FlowConstructor, GraphicsFlow},
    physics::{ColliderRef, PhysicsWorld, StaticPlaneDescriptor},
    render::Render,
    resources::texture::{TextureCache, TextureHandle},
};

pub const GRID_TEXTURE: &str = "textures/grid.png";
pub const AO_TEXTURE: &str = "textures/ground-ao.png";
pub const ALPHA_TEXTURE: &str = "textures/alpha-map.png";

pub const GRID_ANISOTROPY: u16 = 16;

pub const OVERLAY_NAME: &str = "ground overlay";
pub const OVERLAY_SIZE: f32 = 12.0;
pub const OVERLAY_POSITION: [f32; 3] = [-2.285, -0.01, -1.325];
pub const OVERLAY_ROTATION: [f32; 3] = [-FRAC_PI_2, 0.0, 0.0];
pub const OVERLAY_OPACITY: f32 = 0.325;

pub const FLOOR_NAME: &str = "ground floor";
pub const FLOOR_RADIUS: f32 = 6.12;
pub const FLOOR_SEGMENTS: u32 = 50;
// Half a centimetre below the overlay so the grid never z-fights the floor.
pub const FLOOR_POSITION: [f32; 3] = [-2.285, -0.015, -1.325];
pub const FLOOR_ROTATION: [f32; 3] = [-FRAC_PI_2, 0.0, -0.079];

pub const COLLIDER: StaticPlaneDescriptor = StaticPlaneDescriptor {
    rotation: [-FRAC_PI_2, 0.0, 0.0],
    body_type: RigidBodyType::Fixed,
};

/// The three textures the ground is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundTextures {
    pub grid: TextureHandle,
    pub ao: TextureHandle,
    pub alpha: TextureHandle,
}

impl GroundTextures {
    /// Loads all three textures concurrently.
    ///
    /// Every load runs to completion, so the ones that succeed stay cached even
    /// when a sibling fails. The first failure is returned.
    pub async fn load(cache: &TextureCache) -> anyhow::Result<Self> {
        let (grid, ao, alpha) = futures::join!(
            cache.load(GRID_TEXTURE),
            cache.load(AO_TEXTURE),
            cache.load(ALPHA_TEXTURE),
        );
        Ok(Self {
            grid: grid?,
            ao: ao?,
            alpha: alpha?,
        })
    }
}

/// Unlit white overlay whose opacity is masked by the grid texture.
pub fn overlay_material(grid: &TextureHandle) -> BasicMaterial {
    BasicMaterial {
        color: Color::WHITE,
        opacity: OVERLAY_OPACITY,
        transparent: true,
        alpha_map: Some(grid.clone()),
    }
}

pub fn floor_material(ao: &TextureHandle, alpha: &TextureHandle) -> ReflectorMaterial {
    ReflectorMaterial {
        color: Color::gray(0.5),
        transparent: true,
        ao_map: Some(ao.clone()),
        ao_map_intensity: 1.0,
        alpha_map: Some(alpha.clone()),
        env_map_intensity: 0.35,
        metalness: 0.05,
        roughness: 0.4,
        dithering: true,
        blur: [1024, 512],
        mix_blur: 3.0,
        mix_strength: 30.0,
        mix_contrast: 1.0,
        resolution: 1024,
        mirror: 0.0,
        depth_scale: 0.0,
        min_depth_threshold: 0.9,
        max_depth_threshold: 1.0,
        depth_to_blur_ratio_bias: 0.25,
        debug: 0,
        reflector_offset: 0.02,
    }
}

#[derive(Debug)]
pub struct GroundPlane {
    textures: GroundTextures,
    overlay: MeshNode,
    floor: MeshNode,
    collider: Option<ColliderRef>,
    /// Grid texture the anisotropy effect last ran for.
    tuned_grid: Option<TextureHandle>,
    uv2_synced: bool,
}

impl GroundPlane {
    /// Builds both meshes from already loaded textures. Nothing is registered with physics yet.
    pub fn new(textures: GroundTextures) -> Self {
        let overlay = MeshNode::new(
            OVERLAY_NAME,
            Geometry::plane(OVERLAY_SIZE, OVERLAY_SIZE),
            Material::Basic(overlay_material(&textures.grid)),
            OVERLAY_POSITION,
            OVERLAY_ROTATION,
        );
        let floor = MeshNode::new(
            FLOOR_NAME,
            Geometry::circle(FLOOR_RADIUS, FLOOR_SEGMENTS),
            Material::Reflector(floor_material(&textures.ao, &textures.alpha)),
            FLOOR_POSITION,
            FLOOR_ROTATION,
        );
        Self {
            textures,
            overlay,
            floor,
            collider: None,
            tuned_grid: None,
            uv2_synced: false,
        }
    }

    pub async fn load(cache: &TextureCache) -> anyhow::Result<Self> {
        let textures = GroundTextures::load(cache)
            .await
            .context("ground textures are unavailable")?;
        Ok(Self::new(textures))
    }

    /// Registers the collider and runs the mount effects.
    ///
    /// Attaching twice keeps the first collider.
    pub fn attach(&mut self, physics: Option<&mut PhysicsWorld>) -> anyhow::Result<ColliderRef> {
        let collider = match self.collider {
            Some(collider) => collider,
            None => {
                let physics = physics
                    .context("no physics world is available to register the ground collider")?;
                let collider = physics.add_static_plane(&COLLIDER);
                self.collider = Some(collider);
                collider
            }
        };
        self.sync_effects();
        info!("ground mounted");
        Ok(collider)
    }

    /// Loads the textures, then attaches to `physics`.
    pub async fn mount(
        cache: &TextureCache,
        physics: Option<&mut PhysicsWorld>,
    ) -> anyhow::Result<Self> {
        let mut ground = Self::load(cache).await?;
        ground.attach(physics)?;
        Ok(ground)
    }

    /// Runs whichever one-shot effect has not yet run for the current state.
    pub fn sync_effects(&mut self) {
        let grid = &self.textures.grid;
        if !self.tuned_grid.as_ref().is_some_and(|tuned| tuned.ptr_eq(grid)) {
            grid.set_anisotropy(GRID_ANISOTROPY);
            debug!("{} sampled with anisotropy {}", grid.path(), GRID_ANISOTROPY);
            self.tuned_grid = Some(grid.clone());
        }

        if !self.uv2_synced {
            alias_uv2(&mut self.overlay);
            alias_uv2(&mut self.floor);
            self.uv2_synced = true;
        }
    }

    /// Replaces the grid texture of the overlay and tunes the new texture.
    pub fn set_grid_texture(&mut self, grid: TextureHandle) {
        if let Material::Basic(material) = self.overlay.material_mut() {
            material.alpha_map = Some(grid.clone());
        }
        self.textures.grid = grid;
        self.sync_effects();
    }

    /// Puts both meshes on the GPU, or refreshes their uniforms once they are there.
    pub fn upload(&mut self, res: &RenderResources<'_>) {
        self.floor.write_to_buffers(res);
        self.overlay.write_to_buffers(res);
    }

    pub fn textures(&self) -> &GroundTextures {
        &self.textures
    }

    pub fn overlay(&self) -> &MeshNode {
        &self.overlay
    }

    pub fn floor(&self) -> &MeshNode {
        &self.floor
    }

    /// Overlay and floor, in declaration order.
    pub fn meshes(&self) -> [&MeshNode; 2] {
        [&self.overlay, &self.floor]
    }

    pub fn meshes_mut(&mut self) -> [&mut MeshNode; 2] {
        [&mut self.overlay, &mut self.floor]
    }

    pub fn describe(&self) -> Vec<MeshDescriptor> {
        self.meshes().iter().map(|mesh| mesh.descriptor()).collect()
    }

    pub fn collider(&self) -> Option<ColliderRef> {
        self.collider
    }

    /// Where the physics world holds the ground plane, as a scene transform.
    pub fn collider_transform(&self, physics: &PhysicsWorld) -> Option<Instance> {
        physics.body_transform(&self.collider?)
    }

    /// Removes the collider again, returning whether there was one to remove.
    pub fn detach(&mut self, physics: &mut PhysicsWorld) -> bool {
        match self.collider.take() {
            Some(collider) => physics.remove(collider),
            None => false,
        }
    }

    /// Removes the collider and drops the texture handles. The cache keeps the textures.
    pub fn unmount(mut self, physics: &mut PhysicsWorld) -> bool {
        let removed = self.detach(physics);
        info!("ground unmounted");
        removed
    }
}

/// Points `uv2` at the very buffer `uv` uses.
fn alias_uv2(mesh: &mut MeshNode) {
    match mesh.geometry().attribute(geometry::UV).cloned() {
        Some(uv) => mesh
            .geometry_mut()
            .set_attribute(geometry::UV2, BufferAttribute::new(uv.array().clone(), 2)),
        None => warn!("{} has no uv attribute, its uv2 set is left empty", mesh.name()),
    }
}

impl GraphicsFlow for GroundPlane {
    fn on_init(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        self.attach(ctx.physics.as_mut())?;
        self.upload(&ctx.resources());
        Ok(())
    }

    fn on_update(&mut self, ctx: &Context, _dt: Duration) {
        self.sync_effects();
        self.upload(&ctx.resources());
    }

    fn on_exit(&mut self, ctx: &mut Context) {
        if let Some(physics) = ctx.physics.as_mut() {
            self.detach(physics);
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![self.floor.get_render(), self.overlay.get_render()])
    }
}

/// Flow constructor that loads the ground's textures from the context's cache.
pub fn constructor() -> FlowConstructor {
    Box::new(|init: InitContext| {
        Box::pin(async move {
            let ground = GroundPlane::load(&init.textures).await?;
            Ok(Box::new(ground) as Box<dyn GraphicsFlow>)
        })
    })
}
