use crate::viewer::error::{Result, ViewerError};
use bevy::prelude::{Color, Resource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub window_width: u32,
    pub window_height: u32,
    pub msaa_enabled: bool,
    pub camera_fov_deg: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_start: [f32; 3],
    pub orbit_min_distance: f32,
    pub orbit_max_distance: f32,
    pub rotate_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub wall_size: f32,
    pub wall_color: (f32, f32, f32),
    pub floor_color: (f32, f32, f32),
    pub ambient_color: (f32, f32, f32),
    pub ambient_brightness: f32,
    pub light_direction: [f32; 3],
    pub light_illuminance: f32,
    pub shadow_cascades: usize,
    pub shadow_max_distance: f32,
    pub shadow_first_cascade_far_bound: f32,
    pub shadow_map_size: usize,
    pub log_filter: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            window_width: 1600,
            window_height: 900,
            msaa_enabled: true,
            camera_fov_deg: 30.0,
            camera_near: 1.0,
            camera_far: 10_000.0,
            camera_start: [7.0, 13.0, 7.0],
            orbit_min_distance: 2.0,
            orbit_max_distance: 10.0,
            rotate_sensitivity: 0.006,
            pan_sensitivity: 0.0018,
            zoom_sensitivity: 0.10,
            wall_size: 10.0,
            wall_color: (0.537, 0.537, 0.537),
            floor_color: (0.525, 0.475, 0.447),
            ambient_color: (1.0, 1.0, 1.0),
            ambient_brightness: 250.0,
            light_direction: [-1.0, -2.0, -3.0],
            light_illuminance: 12_000.0,
            shadow_cascades: 4,
            shadow_max_distance: 100.0,
            shadow_first_cascade_far_bound: 5.0,
            shadow_map_size: 1024,
            log_filter: "info,wgpu=error,naga=warn".to_string(),
        }
    }
}

impl ViewerSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ViewerError::InvalidSettings(msg.to_string()));

        let finite = [
            self.camera_fov_deg,
            self.camera_near,
            self.camera_far,
            self.orbit_min_distance,
            self.orbit_max_distance,
            self.rotate_sensitivity,
            self.pan_sensitivity,
            self.zoom_sensitivity,
            self.wall_size,
            self.ambient_brightness,
            self.light_illuminance,
            self.shadow_max_distance,
            self.shadow_first_cascade_far_bound,
        ]
        .into_iter()
        .chain(self.camera_start)
        .chain(self.light_direction)
        .all(f32::is_finite);
        if !finite {
            return invalid("numeric settings must be finite");
        }

        // Comparisons are written so that NaN fails them.
        if !(self.camera_fov_deg > 0.0 && self.camera_fov_deg < 180.0) {
            return invalid("camera_fov_deg must be in range (0, 180)");
        }
        if !(self.camera_near > 0.0 && self.camera_far > self.camera_near) {
            return invalid("camera_far must be greater than camera_near, which must be > 0");
        }
        if !(self.orbit_min_distance > 0.0) {
            return invalid("orbit_min_distance must be > 0");
        }
        if !(self.orbit_min_distance <= self.orbit_max_distance) {
            return invalid("orbit_min_distance must not exceed orbit_max_distance");
        }
        if !(self.wall_size > 0.0) {
            return invalid("wall_size must be > 0");
        }
        if self.shadow_cascades == 0 {
            return invalid("shadow_cascades must be at least 1");
        }
        if !(self.shadow_max_distance > 0.0 && self.shadow_first_cascade_far_bound > 0.0) {
            return invalid("shadow distances must be > 0");
        }
        if self.shadow_map_size == 0 {
            return invalid("shadow_map_size must be > 0");
        }
        if self.light_direction == [0.0; 3] {
            return invalid("light_direction must not be zero");
        }
        if self.window_width == 0 || self.window_height == 0 {
            return invalid("window size must be non-zero");
        }

        Ok(())
    }

    pub fn wall_color(&self) -> Color {
        let (r, g, b) = self.wall_color;
        Color::srgb(r, g, b)
    }

    pub fn floor_color(&self) -> Color {
        let (r, g, b) = self.floor_color;
        Color::srgb(r, g, b)
    }

    pub fn ambient_color(&self) -> Color {
        let (r, g, b) = self.ambient_color;
        Color::srgb(r, g, b)
    }
}

/// Reads settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<ViewerSettings> {
    if !path.exists() {
        return Ok(ViewerSettings::default());
    }

    let text = fs::read_to_string(path).map_err(|source| ViewerError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let settings =
        ron::from_str::<ViewerSettings>(&text).map_err(|source| ViewerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()?;
    Ok(settings)
}

pub fn load_or_default(path: &Path) -> ViewerSettings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("{err}; falling back to default settings");
            ViewerSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &ViewerSettings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ViewerError::ConfigWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::default())?;
    fs::write(path, content).map_err(|source| ViewerError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!("settings written to {}", path.display());
    Ok(())
}
