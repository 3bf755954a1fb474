//! Viewer configuration.
//!
//! [`ViewerConfig`] collects every knob the viewer exposes. There is no config
//! file and no environment variable: callers build a config in code, usually
//! starting from [`ViewerConfig::default`] and overriding a few fields.

use std::f32::consts::PI;

use instant::Duration;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Directory every asset path is resolved against.
    pub asset_root: String,
    /// glTF or GLB file, relative to `asset_root`.
    pub model_path: String,
    /// Equirectangular `.hdr` panorama, relative to `asset_root`.
    pub environment_path: String,
    pub title: String,
    pub clear_colour: wgpu::Color,
    pub camera_position: cgmath::Point3<f32>,
    pub fovy: cgmath::Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Channel offset of the RGB shift effect in UV units.
    pub rgb_shift_amount: f32,
    /// Direction of the channel offset.
    pub rgb_shift_angle: cgmath::Rad<f32>,
    pub tween_duration: Duration,
    /// Largest tilt reached at the viewport edge, in either direction.
    pub max_tilt: cgmath::Rad<f32>,
    pub environment_intensity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: "assets".to_string(),
            model_path: "model.glb".to_string(),
            environment_path: "environment.hdr".to_string(),
            title: "tilt-viewer".to_string(),
            clear_colour: wgpu::Color::BLACK,
            camera_position: cgmath::Point3::new(0.0, 0.0, 3.5),
            fovy: cgmath::Deg(40.0),
            znear: 0.1,
            zfar: 100.0,
            rgb_shift_amount: 0.0015,
            rgb_shift_angle: cgmath::Rad(0.0),
            tween_duration: Duration::from_millis(500),
            max_tilt: cgmath::Rad(0.1 * PI),
            environment_intensity: 1.0,
        }
    }
}

impl ViewerConfig {
    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_model(mut self, path: impl Into<String>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_environment(mut self, path: impl Into<String>) -> Self {
        self.environment_path = path.into();
        self
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_rgb_shift(mut self, amount: f32, angle: cgmath::Rad<f32>) -> Self {
        self.rgb_shift_amount = amount;
        self.rgb_shift_angle = angle;
        self
    }

    pub fn with_tween_duration(mut self, duration: Duration) -> Self {
        self.tween_duration = duration;
        self
    }

    pub fn with_max_tilt(mut self, max_tilt: cgmath::Rad<f32>) -> Self {
        self.max_tilt = max_tilt;
        self
    }
}
