use flow_ground::{
    data_structures::{
        geometry::{self, Geometry, GeometryKind},
        instance::euler_xyz,
        material::Material,
        mesh::interleave,
    },
    flow::GraphicsFlow,
    ground::{
        ALPHA_TEXTURE, AO_TEXTURE, COLLIDER, FLOOR_NAME, FLOOR_POSITION, FLOOR_ROTATION,
        GRID_ANISOTROPY, GRID_TEXTURE, GroundPlane, OVERLAY_NAME, OVERLAY_POSITION,
        OVERLAY_ROTATION, floor_material, overlay_material,
    },
    physics::PhysicsWorld,
};
use image::Rgba;

use crate::common::test_utils::{AssetDir, assert_close};

mod common;

#[tokio::test]
async fn should_tune_only_the_grid_texture() {
    let assets = AssetDir::with_ground_textures("mount-anisotropy");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();

    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();

    assert_eq!(ground.textures().grid.anisotropy(), GRID_ANISOTROPY);
    assert_eq!(cache.get(GRID_TEXTURE).unwrap().anisotropy(), 16);
    assert_eq!(ground.textures().ao.anisotropy(), 1);
    assert_eq!(ground.textures().alpha.anisotropy(), 1);
}

#[tokio::test]
async fn should_alias_uv2_to_uv_on_both_meshes() {
    let assets = AssetDir::with_ground_textures("mount-uv2");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();

    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();

    for mesh in ground.meshes() {
        let uv = mesh.geometry().attribute(geometry::UV).unwrap();
        let uv2 = mesh.geometry().attribute(geometry::UV2).unwrap();
        assert_eq!(uv2.item_size(), 2);
        assert!(uv2.shares_buffer_with(uv), "{} copied its uv buffer", mesh.name());
        assert_eq!(&uv2.array()[..], &uv.array()[..]);
        assert!(interleave(mesh.geometry()).iter().all(|v| v.uv == v.uv2));
    }
}

#[tokio::test]
async fn should_not_derive_uv2_again_after_a_geometry_swap() {
    let assets = AssetDir::with_ground_textures("mount-geometry-swap");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let mut ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();

    let [_, floor] = ground.meshes_mut();
    floor.set_geometry(Geometry::circle(3.0, 8));
    ground.sync_effects();

    let floor = ground.floor().geometry();
    assert_eq!(floor.kind(), GeometryKind::Circle { radius: 3.0, segments: 8 });
    assert!(floor.attribute(geometry::UV2).is_none());
    assert!(ground.overlay().geometry().attribute(geometry::UV2).is_some());
}

#[tokio::test]
async fn should_skip_uv2_for_meshes_without_uv() {
    let assets = AssetDir::with_ground_textures("mount-missing-uv");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let mut ground = GroundPlane::load(&cache).await.unwrap();

    let [overlay, _] = ground.meshes_mut();
    overlay.geometry_mut().remove_attribute(geometry::UV);
    ground.attach(Some(&mut world)).unwrap();

    assert!(ground.overlay().geometry().attribute(geometry::UV2).is_none());
    assert!(ground.floor().geometry().attribute(geometry::UV2).is_some());

    // Not retried once uv shows up again.
    let [overlay, _] = ground.meshes_mut();
    overlay.set_geometry(Geometry::plane(12.0, 12.0));
    ground.sync_effects();
    assert!(ground.overlay().geometry().attribute(geometry::UV2).is_none());
}

#[tokio::test]
async fn should_register_one_fixed_collider() {
    let assets = AssetDir::with_ground_textures("mount-collider");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();

    let mut ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();
    let collider = ground.collider().unwrap();

    assert_eq!(COLLIDER.rotation, [-std::f32::consts::FRAC_PI_2, 0.0, 0.0]);
    assert!(world.contains(&collider));
    assert!(world.body(&collider).unwrap().is_fixed());
    assert_eq!(world.colliders.len(), 1);

    let transform = ground.collider_transform(&world).unwrap();
    let expected = euler_xyz(COLLIDER.rotation);
    assert_close(transform.rotation.s, expected.s);
    assert_close(transform.rotation.v.x, expected.v.x);

    // attaching again keeps the first collider
    assert_eq!(ground.attach(Some(&mut world)).unwrap(), collider);
    assert_eq!(world.bodies.len(), 1);
}

#[tokio::test]
async fn should_fail_to_mount_without_physics() {
    let assets = AssetDir::with_ground_textures("mount-no-physics");
    let cache = assets.cache();

    let err = GroundPlane::mount(&cache, None).await.unwrap_err();

    assert!(format!("{:#}", err).contains("physics"));
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn should_fail_to_mount_without_the_alpha_map() {
    let assets = AssetDir::with_ground_textures("mount-no-alpha");
    assets.remove(ALPHA_TEXTURE);
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();

    let err = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap_err();

    assert!(format!("{:#}", err).contains(ALPHA_TEXTURE));
    assert!(cache.get(GRID_TEXTURE).is_some());
    assert!(cache.get(AO_TEXTURE).is_some());
    assert!(cache.get(ALPHA_TEXTURE).is_none());
    assert!(world.bodies.is_empty());
}

#[tokio::test]
async fn should_fail_to_mount_with_a_corrupt_grid() {
    let assets = AssetDir::with_ground_textures("mount-corrupt-grid");
    assets.write_bytes(GRID_TEXTURE, b"\x89PNG but not really");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();

    let err = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap_err();

    assert!(format!("{:#}", err).contains(GRID_TEXTURE));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn should_describe_overlay_then_floor() {
    let assets = AssetDir::with_ground_textures("mount-describe");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();
    let textures = ground.textures();

    let meshes = ground.describe();

    assert_eq!(meshes.len(), 2);
    let (overlay, floor) = (&meshes[0], &meshes[1]);

    assert_eq!(overlay.name, OVERLAY_NAME);
    assert_eq!(overlay.geometry, GeometryKind::Plane { width: 12.0, height: 12.0 });
    assert_eq!(overlay.position, [-2.285, -0.01, -1.325]);
    assert_eq!(overlay.position, OVERLAY_POSITION);
    assert_eq!(overlay.rotation, OVERLAY_ROTATION);
    assert_eq!(overlay.material, Material::Basic(overlay_material(&textures.grid)));

    assert_eq!(floor.name, FLOOR_NAME);
    assert_eq!(floor.geometry, GeometryKind::Circle { radius: 6.12, segments: 50 });
    assert_eq!(floor.position, [-2.285, -0.015, -1.325]);
    assert_eq!(floor.position, FLOOR_POSITION);
    assert_eq!(floor.rotation, FLOOR_ROTATION);
    assert_close(floor.rotation[2], -0.079);
    assert_eq!(
        floor.material,
        Material::Reflector(floor_material(&textures.ao, &textures.alpha))
    );

    let overlay_transform = ground.overlay().transform();
    assert_close(overlay_transform.position.y, -0.01);
    assert_close(ground.floor().transform().position.y, -0.015);
}

#[tokio::test]
async fn should_swap_the_grid_texture_and_tune_it() {
    let assets = AssetDir::with_ground_textures("mount-grid-swap");
    assets.write_png("textures/grid-fine.png", 32, 32, |x, y| {
        let v = if x % 2 == 0 || y % 2 == 0 { 255 } else { 0 };
        Rgba([v, v, v, 255])
    });
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let mut ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();
    let fine = cache.load("textures/grid-fine.png").await.unwrap();
    assert_eq!(fine.anisotropy(), 1);

    ground.set_grid_texture(fine.clone());

    assert_eq!(fine.anisotropy(), GRID_ANISOTROPY);
    assert!(ground.textures().grid.ptr_eq(&fine));
    match ground.overlay().material() {
        Material::Basic(material) => {
            assert!(material.alpha_map.as_ref().unwrap().ptr_eq(&fine))
        }
        other => panic!("overlay uses {:?}", other),
    }
    assert_eq!(ground.textures().ao.anisotropy(), 1);
}

#[tokio::test]
async fn should_unmount_and_keep_the_cache() {
    let assets = AssetDir::with_ground_textures("mount-unmount");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();
    let collider = ground.collider().unwrap();

    assert!(ground.unmount(&mut world));

    assert!(!world.contains(&collider));
    assert!(world.bodies.is_empty());
    assert!(world.colliders.is_empty());
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(GRID_TEXTURE).unwrap().anisotropy(), GRID_ANISOTROPY);
}

#[tokio::test]
async fn should_draw_nothing_before_upload() {
    let assets = AssetDir::with_ground_textures("mount-render");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();

    assert!(ground.meshes().iter().all(|mesh| !mesh.is_uploaded()));
    assert!(ground.on_render().is_empty());

    let batches = ground.on_render().into_batches();
    assert!(batches.reflective.is_empty());
    assert!(batches.unlit.is_empty());
}
