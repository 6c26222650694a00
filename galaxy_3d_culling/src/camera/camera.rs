/// Camera - low-level passive data container.
///
/// The caller (game engine) computes and sets the view matrix and the
/// projection parameters. The culling passes only read them.

use glam::{Mat4, Vec3};

/// Perspective projection parameters (right-handed, depth in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self { fov_y, aspect, near, far }
    }

    /// Focal factor `g = 1 / tan(fov_y / 2)`.
    pub fn focal_factor(&self) -> f32 {
        1.0 / (self.fov_y * 0.5).tan()
    }

    /// Projection matrix (`Mat4::perspective_rh`).
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Low-level camera. A passive data container.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection: Projection,
    viewport_width: u32,
    viewport_height: u32,
}

impl Camera {
    /// Create a new camera from a view matrix (world → camera).
    pub fn new(view: Mat4, projection: Projection, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            view_matrix: view,
            projection,
            viewport_width,
            viewport_height,
        }
    }

    /// Camera at `eye` looking at `target` (`Mat4::look_at_rh`).
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, projection: Projection, viewport_width: u32, viewport_height: u32) -> Self {
        Self::new(Mat4::look_at_rh(eye, target, up), projection, viewport_width, viewport_height)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Camera world transform (camera → world).
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix.inverse()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection.matrix() * self.view_matrix
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.world_matrix().w_axis.truncate()
    }

    /// Unit view direction in world space (camera −Z).
    pub fn forward(&self) -> Vec3 {
        (-self.world_matrix().z_axis.truncate()).normalize_or_zero()
    }

    /// Viewport size in pixels (width, height).
    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    // ===== SETTERS - store, compute nothing =====

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
