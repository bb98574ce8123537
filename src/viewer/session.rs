use crate::viewer::camera::{OrbitController, ViewerCamera, camera_view};
use crate::viewer::frame_fit::CameraView;
use crate::viewer::lighting::{CascadeBounds, ViewerSun, refresh_cascades};
use crate::viewer::model::ModelSlot;
use crate::viewer::render_loop::{RedrawHooks, RenderLoopDriver};
use crate::viewer::settings::ViewerSettings;
use bevy::light::CascadeShadowConfig;
use bevy::prelude::*;
use bevy::window::{RequestRedraw, WindowResized};

/// Everything that asks for a redraw, drained in arrival order.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    CameraChanged,
    ModelReady,
    Resized,
}

/// Per-session viewer state: orbit controls, the fit state machine and the
/// model slot.
#[derive(Resource)]
pub struct ViewerSession {
    pub orbit: OrbitController,
    pub driver: RenderLoopDriver,
    pub model: ModelSlot,
    pub url_input: String,
}

impl ViewerSession {
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            orbit: OrbitController::from_settings(settings),
            driver: RenderLoopDriver::default(),
            model: ModelSlot::Idle,
            url_input: String::new(),
        }
    }
}

struct EngineFrame<'a, 'w> {
    camera: &'a mut Transform,
    projection: &'a Projection,
    orbit: &'a mut OrbitController,
    settings: &'a ViewerSettings,
    /// Half-diagonal of the loaded model, zero while the room is empty.
    model_radius: f32,
    sun: Option<(&'a mut CascadeShadowConfig, &'a mut CascadeBounds)>,
    redraw: &'a mut MessageWriter<'w, RequestRedraw>,
}

impl RedrawHooks for EngineFrame<'_, '_> {
    fn camera_view(&self) -> CameraView {
        camera_view(
            &*self.camera,
            self.projection,
            self.settings.camera_fov_deg.to_radians(),
        )
    }

    fn set_camera_position(&mut self, position: Vec3) {
        self.camera.translation = position;
        self.orbit.sync_from_position(position);
    }

    fn update_shadows(&mut self) {
        let near = match self.projection {
            Projection::Perspective(perspective) => perspective.near,
            _ => self.settings.camera_near,
        };
        let reach = self.camera.translation.distance(self.orbit.target) + self.model_radius;
        if let Some((config, current)) = self.sun.as_mut() {
            let wanted = CascadeBounds::for_camera(self.settings, near, reach);
            refresh_cascades(config, current, wanted);
        }
    }

    fn submit_frame(&mut self) {
        self.redraw.write(RequestRedraw);
    }
}

pub fn forward_window_resizes(
    mut resized: MessageReader<WindowResized>,
    mut events: MessageWriter<ViewerEvent>,
) {
    if resized.read().count() > 0 {
        events.write(ViewerEvent::Resized);
    }
}

pub fn redraw_system(
    mut events: MessageReader<ViewerEvent>,
    mut session: ResMut<ViewerSession>,
    settings: Res<ViewerSettings>,
    mut camera_query: Query<(&mut Transform, &Projection), With<ViewerCamera>>,
    mut sun_query: Query<(&mut CascadeShadowConfig, &mut CascadeBounds), With<ViewerSun>>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    let pending: Vec<ViewerEvent> = events.read().copied().collect();
    if pending.is_empty() {
        return;
    }
    debug!(?pending, "redraw requested");

    let Ok((mut camera, projection)) = camera_query.single_mut() else {
        return;
    };
    let mut sun = sun_query.single_mut().ok();
    let session = &mut *session;
    let model_radius = session
        .model
        .bounds()
        .map_or(0.0, |bounds| 0.5 * bounds.size().length());

    let mut frame = EngineFrame {
        camera: &mut *camera,
        projection,
        orbit: &mut session.orbit,
        settings: &settings,
        model_radius,
        sun: sun
            .as_mut()
            .map(|(config, bounds)| (&mut **config, &mut **bounds)),
        redraw: &mut redraw,
    };
    let report = session.driver.redraw(&mut frame);
    if let Some(fit) = report.fit {
        info!(
            frame = session.driver.redraw_count(),
            pushed_back = fit.max_depth,
            position = %fit.position,
            "camera framed to model"
        );
    }
}
