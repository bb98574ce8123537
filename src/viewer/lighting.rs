use crate::viewer::settings::ViewerSettings;
use bevy::light::{CascadeShadowConfig, CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::prelude::*;
use tracing::debug;

/// Smallest gap kept between consecutive cascade bounds.
const MIN_CASCADE_SPAN: f32 = 0.05;

#[derive(Component)]
pub struct ViewerSun;

/// Cascade layout last pushed to the directional light.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CascadeBounds {
    pub num_cascades: usize,
    pub minimum: f32,
    pub first_far: f32,
    pub maximum: f32,
}

impl CascadeBounds {
    /// Lays the cascades out so the first one ends no closer than `reach`,
    /// the distance from the camera to the far side of the model.
    pub fn for_camera(settings: &ViewerSettings, near: f32, reach: f32) -> Self {
        let minimum = near.max(0.0);
        let maximum = settings
            .shadow_max_distance
            .min(settings.camera_far)
            .max(minimum + 2.0 * MIN_CASCADE_SPAN);
        let reach = if reach.is_finite() { reach } else { 0.0 };
        let first_far = settings
            .shadow_first_cascade_far_bound
            .max(reach)
            .clamp(minimum + MIN_CASCADE_SPAN, maximum);

        Self {
            num_cascades: settings.shadow_cascades.max(1),
            minimum,
            first_far,
            maximum,
        }
    }

    pub fn build(&self) -> CascadeShadowConfig {
        CascadeShadowConfigBuilder {
            num_cascades: self.num_cascades,
            minimum_distance: self.minimum,
            maximum_distance: self.maximum,
            first_cascade_far_bound: self.first_far,
            ..default()
        }
        .build()
    }
}

pub fn light_transform(settings: &ViewerSettings) -> Transform {
    let direction = Vec3::from_array(settings.light_direction)
        .try_normalize()
        .unwrap_or(Vec3::NEG_Y);
    let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Transform::default().looking_to(direction, up)
}

pub fn setup_lighting(mut commands: Commands, settings: Res<ViewerSettings>) {
    let bounds = CascadeBounds::for_camera(
        &settings,
        settings.camera_near,
        settings.orbit_max_distance,
    );

    commands.insert_resource(GlobalAmbientLight {
        color: settings.ambient_color(),
        brightness: settings.ambient_brightness,
        affects_lightmapped_meshes: true,
    });
    commands.insert_resource(DirectionalLightShadowMap {
        size: settings.shadow_map_size,
    });

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            shadows_enabled: true,
            illuminance: settings.light_illuminance,
            ..default()
        },
        light_transform(&settings),
        bounds.build(),
        bounds,
        ViewerSun,
    ));
}

/// Re-lays the cascades for the current camera. Returns whether the light
/// configuration changed.
pub fn refresh_cascades(
    config: &mut CascadeShadowConfig,
    current: &mut CascadeBounds,
    wanted: CascadeBounds,
) -> bool {
    if *current == wanted {
        return false;
    }

    debug!(?wanted, "refreshing shadow cascades");
    *config = wanted.build();
    *current = wanted;
    true
}
