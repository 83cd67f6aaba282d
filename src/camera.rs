//! Camera and scene uniforms.
//!
//! The ground has no input handling, so the camera is a fixed look-at camera
//! whose pose can be changed by flows through the context.

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Per-frame data shared by every pipeline at bind group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
    light_position: [f32; 4],
    /// rgb + ambient intensity
    light_color: [f32; 4],
    /// width, height of the viewport in pixels
    viewport: [f32; 4],
}

impl SceneUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: Matrix4::identity().into(),
            view_position: [0.0; 4],
            light_position: [8.0, 80.0, 50.0, 1.0],
            light_color: [1.0, 1.0, 1.0, 0.35],
            viewport: [1.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }

    pub fn update_viewport(&mut self, width: u32, height: u32) {
        self.viewport = [width as f32, height as f32, 0.0, 0.0];
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera pose that frames the ground from above and in front.
pub fn default_camera() -> Camera {
    let target = Point3::new(-2.285, 0.0, -1.325);
    Camera::new(target + Vector3::new(0.0, 6.0, 10.0), target)
}

