use flow_ground::{
    data_structures::material::{
        BasicMaterial, BasicUniform, Material, ReflectorMaterial, ReflectorUniform,
    },
    ground::{GroundPlane, OVERLAY_OPACITY},
    physics::PhysicsWorld,
};

use crate::common::test_utils::AssetDir;

mod common;

async fn mounted(name: &str) -> (AssetDir, GroundPlane) {
    let assets = AssetDir::with_ground_textures(name);
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();
    (assets, ground)
}

#[tokio::test]
async fn should_pack_the_overlay_opacity() {
    let (_assets, ground) = mounted("material-overlay").await;

    let bytes = ground.overlay().material().uniform_bytes();
    let uniform: BasicUniform = bytemuck::pod_read_unaligned(&bytes);

    assert_eq!(OVERLAY_OPACITY, 0.325);
    assert_eq!(uniform.color, [1.0, 1.0, 1.0, 0.325]);
    assert_eq!(uniform.flags[0], 1.0);
    assert!(ground.overlay().material().is_transparent());
}

#[tokio::test]
async fn should_pack_the_floor_parameters() {
    let (_assets, ground) = mounted("material-floor").await;

    let bytes = ground.floor().material().uniform_bytes();
    let uniform: ReflectorUniform = bytemuck::pod_read_unaligned(&bytes);

    assert_eq!(uniform.color, [0.5, 0.5, 0.5, 1.0]);
    // metalness, roughness, env map intensity, ao map intensity
    assert_eq!(uniform.surface, [0.05, 0.4, 0.35, 1.0]);
    // mix blur, strength, contrast, mirror
    assert_eq!(uniform.mix, [3.0, 30.0, 1.0, 0.0]);
    assert_eq!(uniform.depth, [0.0, 0.9, 1.0, 0.25]);
    assert_eq!(uniform.reflection, [1024.0, 512.0, 1024.0, 0.02]);
    // dithering, debug, ao map, alpha map
    assert_eq!(uniform.flags, [1.0, 0.0, 1.0, 1.0]);
}

#[tokio::test]
async fn should_keep_uniforms_identical_across_frames() {
    let (_assets, mut ground) = mounted("material-stable").await;
    let before: Vec<Vec<u8>> = ground
        .meshes()
        .iter()
        .map(|mesh| mesh.material().uniform_bytes())
        .collect();

    for _ in 0..3 {
        ground.sync_effects();
    }

    let after: Vec<Vec<u8>> = ground
        .meshes()
        .iter()
        .map(|mesh| mesh.material().uniform_bytes())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn should_ignore_opacity_of_opaque_materials() {
    let material = Material::Basic(BasicMaterial {
        opacity: 0.5,
        transparent: false,
        ..Default::default()
    });

    let uniform: BasicUniform = bytemuck::pod_read_unaligned(&material.uniform_bytes());

    assert_eq!(uniform.color[3], 1.0);
    assert_eq!(uniform.flags[0], 0.0);
    assert_eq!(material.texture_slots(), vec![None]);
}

#[test]
fn should_bind_ao_before_alpha() {
    let material = Material::Reflector(Default::default());
    assert_eq!(material.texture_slots().len(), 2);
    assert!(!material.is_transparent());
}

#[tokio::test]
async fn should_ignore_alpha_maps_of_opaque_materials() {
    let (_assets, ground) = mounted("material-opaque-alpha").await;
    let textures = ground.textures();

    let floor = Material::Reflector(ReflectorMaterial {
        transparent: false,
        alpha_map: Some(textures.alpha.clone()),
        ..Default::default()
    });
    let overlay = Material::Basic(BasicMaterial {
        opacity: 0.5,
        transparent: false,
        alpha_map: Some(textures.grid.clone()),
        ..Default::default()
    });

    let floor_uniform: ReflectorUniform = bytemuck::pod_read_unaligned(&floor.uniform_bytes());
    let overlay_uniform: BasicUniform = bytemuck::pod_read_unaligned(&overlay.uniform_bytes());

    assert_eq!(floor_uniform.color[3], 1.0);
    assert_eq!(floor_uniform.flags[3], 0.0);
    assert_eq!(overlay_uniform.color[3], 1.0);
    assert_eq!(overlay_uniform.flags[0], 0.0);
    // The maps stay bound so the bind group layout is unchanged.
    assert_eq!(floor.texture_slots().len(), 2);
    assert!(floor.texture_slots()[1].is_some());
    assert!(overlay.texture_slots()[0].is_some());
}
