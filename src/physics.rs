//! Rapier 3D physics world.
//!
//! Holds the rapier sets and pipelines and exposes the handful of operations
//! the scene needs: registering a static infinite plane, removing it again,
//! stepping the simulation and reading a body's pose back as a scene transform.

use rapier3d::prelude::*;

use crate::data_structures::instance::Instance;

/// Earth gravity along -Y.
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Handles of a body and its collider, held by whoever registered them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderRef {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// What a static plane was registered with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticPlaneDescriptor {
    /// Euler angles in radians, XYZ order.
    pub rotation: [f32; 3],
    pub body_type: RigidBodyType,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: BroadPhase,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: [f32; 3]) -> Self {
        Self {
            gravity: vector![gravity[0], gravity[1], gravity[2]],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Registers an infinite plane through the origin.
    ///
    /// Unrotated, the plane's solid side lies below its local XY plane (normal +Z),
    /// so a rotation of `(-π/2, 0, 0)` turns it into a floor facing +Y.
    pub fn add_static_plane(&mut self, descriptor: &StaticPlaneDescriptor) -> ColliderRef {
        let orientation = euler_to_rotation(descriptor.rotation);
        let body = RigidBodyBuilder::new(descriptor.body_type)
            .rotation(orientation.scaled_axis())
            .build();
        let collider = ColliderBuilder::halfspace(Vector::z_axis()).build();
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        log::info!(
            "registered {:?} plane {:?} with rotation {:?}",
            descriptor.body_type,
            body,
            descriptor.rotation
        );
        ColliderRef { body, collider }
    }

    /// Removes the body and every collider attached to it.
    pub fn remove(&mut self, handle: ColliderRef) -> bool {
        self.bodies
            .remove(
                handle.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, handle: &ColliderRef) -> bool {
        self.bodies.contains(handle.body) && self.colliders.contains(handle.collider)
    }

    pub fn body(&self, handle: &ColliderRef) -> Option<&RigidBody> {
        self.bodies.get(handle.body)
    }

    /// Pose of the referenced body as a scene transform.
    pub fn body_transform(&self, handle: &ColliderRef) -> Option<Instance> {
        let body = self.bodies.get(handle.body)?;
        let t = body.translation();
        let r = body.rotation();
        Some(Instance {
            position: cgmath::Vector3::new(t.x, t.y, t.z),
            rotation: cgmath::Quaternion::new(r.w, r.i, r.j, r.k),
            ..Default::default()
        })
    }

    /// Roll, pitch and yaw of the referenced body in radians.
    pub fn body_euler(&self, handle: &ColliderRef) -> Option<[f32; 3]> {
        let (x, y, z) = self.bodies.get(handle.body)?.rotation().euler_angles();
        Some([x, y, z])
    }

    pub fn step(&mut self, dt: f32) {
        // Clamp dt to avoid instability
        self.integration_parameters.dt = dt.clamp(0.0, 1.0 / 15.0);
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish_non_exhaustive()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

/// Same XYZ convention as [`crate::data_structures::instance::euler_xyz`].
fn euler_to_rotation(rotation: [f32; 3]) -> Rotation<Real> {
    Rotation::from_axis_angle(&Vector::x_axis(), rotation[0])
        * Rotation::from_axis_angle(&Vector::y_axis(), rotation[1])
        * Rotation::from_axis_angle(&Vector::z_axis(), rotation[2])
}
