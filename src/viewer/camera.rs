use crate::viewer::frame_fit::CameraView;
use crate::viewer::session::{ViewerEvent, ViewerSession};
use crate::viewer::settings::ViewerSettings;
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

const MAX_PITCH: f32 = 1.45;

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Resource, Default)]
pub struct UiInteractionState {
    pub wants_pointer_input: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitInput {
    pub rotate: Vec2,
    pub pan: Vec2,
    pub zoom: f32,
}

impl OrbitInput {
    pub fn is_idle(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom.abs() <= f32::EPSILON
    }
}

/// Orbit navigation around a view target, Y up.
///
/// Distance is clamped to `[min_distance, max_distance]` whenever input is
/// applied or the target moves, but not when the camera is moved externally.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl OrbitController {
    pub fn from_settings(settings: &ViewerSettings) -> Self {
        let mut orbit = Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1.0,
            min_distance: settings.orbit_min_distance,
            max_distance: settings.orbit_max_distance,
            rotate_sensitivity: settings.rotate_sensitivity,
            pan_sensitivity: settings.pan_sensitivity,
            zoom_sensitivity: settings.zoom_sensitivity,
        };
        orbit.sync_from_position(Vec3::from_array(settings.camera_start));
        orbit.clamp_distance();
        orbit
    }

    pub fn position(&self) -> Vec3 {
        self.target + orbit_offset(self.yaw, self.pitch) * self.distance
    }

    pub fn pose(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// Re-derives the spherical coordinates for a camera placed at `position`.
    pub fn sync_from_position(&mut self, position: Vec3) {
        let offset = position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON || !distance.is_finite() {
            return;
        }

        self.distance = distance;
        self.pitch = (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw = offset.x.atan2(offset.z);
    }

    /// Moves the orbit pivot while keeping the camera where it is, then
    /// clamps the distance.
    pub fn set_target(&mut self, target: Vec3) {
        let position = self.position();
        self.target = target;
        self.sync_from_position(position);
        self.clamp_distance();
    }

    pub fn apply(&mut self, input: OrbitInput) -> bool {
        let before = (self.target, self.yaw, self.pitch, self.distance);

        if input.rotate != Vec2::ZERO {
            self.yaw -= input.rotate.x * self.rotate_sensitivity;
            self.pitch =
                (self.pitch + input.rotate.y * self.rotate_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
        }

        if input.pan != Vec2::ZERO {
            let pose = self.pose();
            let right = pose.rotation * Vec3::X;
            let up = pose.rotation * Vec3::Y;
            let pan_scale = self.distance * self.pan_sensitivity;
            self.target += (-input.pan.x * right + input.pan.y * up) * pan_scale;
        }

        if input.zoom.abs() > f32::EPSILON {
            let zoom_factor = (1.0 - input.zoom * self.zoom_sensitivity).clamp(0.2, 5.0);
            self.distance *= zoom_factor;
        }

        if !input.is_idle() {
            self.clamp_distance();
        }

        before != (self.target, self.yaw, self.pitch, self.distance)
    }

    fn clamp_distance(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }
}

fn orbit_offset(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        pitch.cos() * yaw.sin(),
        pitch.sin(),
        pitch.cos() * yaw.cos(),
    )
}

pub fn camera_view(transform: &Transform, projection: &Projection, fallback_fov: f32) -> CameraView {
    let (fov_y, aspect) = match projection {
        Projection::Perspective(perspective) => (perspective.fov, perspective.aspect_ratio),
        _ => (fallback_fov, 1.0),
    };

    CameraView {
        position: transform.translation,
        rotation: transform.rotation,
        fov_y,
        aspect,
    }
}

pub fn orbit_camera_system(
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    ui_state: Res<UiInteractionState>,
    mut session: ResMut<ViewerSession>,
    mut camera_query: Query<&mut Transform, With<ViewerCamera>>,
    mut events: MessageWriter<ViewerEvent>,
) {
    let pointer_in_window = windows
        .single()
        .ok()
        .and_then(|w| w.cursor_position())
        .is_some();
    if !pointer_in_window || ui_state.wants_pointer_input {
        return;
    }

    let mouse_delta = mouse_motion.delta;
    let mut input = OrbitInput {
        zoom: mouse_scroll.delta.y,
        ..default()
    };
    if mouse_buttons.pressed(MouseButton::Left) {
        input.rotate = mouse_delta;
    } else if mouse_buttons.pressed(MouseButton::Right) {
        input.pan = mouse_delta;
    }

    if input.is_idle() {
        return;
    }

    if let Ok(transform) = camera_query.single() {
        session.orbit.sync_from_position(transform.translation);
    }
    if !session.orbit.apply(input) {
        return;
    }

    for mut transform in &mut camera_query {
        *transform = session.orbit.pose();
    }
    events.write(ViewerEvent::CameraChanged);
}
