//! Camera with perspective and orthographic projections.

use glam::{Mat4, Vec3};

/// Camera projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in degrees.
        fov_degrees: f32,
        /// Viewport aspect ratio (width / height).
        aspect_ratio: f32,
        /// Near clip plane distance.
        z_near: f32,
        /// Far clip plane distance.
        z_far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half of the vertical view extent in world units.
        half_extent: f32,
        /// Viewport aspect ratio (width / height).
        aspect_ratio: f32,
        /// Near clip plane distance.
        z_near: f32,
        /// Far clip plane distance.
        z_far: f32,
    },
}

impl Projection {
    /// Compute the projection matrix.
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_degrees,
                aspect_ratio,
                z_near,
                z_far,
            } => Mat4::perspective_rh(fov_degrees.to_radians(), aspect_ratio, z_near, z_far),
            Self::Orthographic {
                half_extent,
                aspect_ratio,
                z_near,
                z_far,
            } => {
                let half_width = half_extent * aspect_ratio;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_extent,
                    half_extent,
                    z_near,
                    z_far,
                )
            }
        }
    }
}

/// A look-at camera.
///
/// Position, target and up vector are public; call [`Camera::update`]
/// after changing them to recompute the cached view matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Projection parameters.
    pub projection: Projection,
    view: Mat4,
}

impl Camera {
    /// Create a perspective camera at `position` looking at `target`.
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_degrees: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        Self::new(
            position,
            target,
            up,
            Projection::Perspective {
                fov_degrees,
                aspect_ratio,
                z_near,
                z_far,
            },
        )
    }

    /// Create an orthographic camera at `position` looking at `target`.
    pub fn orthographic(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        half_extent: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        Self::new(
            position,
            target,
            up,
            Projection::Orthographic {
                half_extent,
                aspect_ratio,
                z_near,
                z_far,
            },
        )
    }

    fn new(position: Vec3, target: Vec3, up: Vec3, projection: Projection) -> Self {
        let mut camera = Self {
            position,
            target,
            up,
            projection,
            view: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Recompute the view matrix from position, target and up.
    pub fn update(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.target, self.up);
    }

    /// Get the cached view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Compute the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Compute the combined projection * view matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view
    }
}
