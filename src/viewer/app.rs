use crate::viewer::camera::{
    UiInteractionState, ViewerCamera, orbit_camera_system,
};
use crate::viewer::cli::CliOptions;
use crate::viewer::lighting::setup_lighting;
use crate::viewer::model::{StartupRequest, poll_model_load, start_from_cli};
use crate::viewer::room::setup_room;
use crate::viewer::session::{ViewerEvent, ViewerSession, forward_window_resizes, redraw_system};
use crate::viewer::settings::{ViewerSettings, load_or_default, save_settings};
use crate::viewer::ui::ui_system;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin, WindowResolution};
use bevy::winit::{UpdateMode, WinitSettings};
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use std::time::Duration;

pub fn run(options: CliOptions) -> anyhow::Result<()> {
    let settings = load_or_default(&options.config_path);

    if options.write_default_config {
        save_settings(&options.config_path, &ViewerSettings::default())?;
        return Ok(());
    }

    App::new()
        .insert_resource(ViewerSession::new(&settings))
        .insert_resource(StartupRequest { url: options.url })
        .insert_resource(UiInteractionState::default())
        .insert_resource(WinitSettings {
            focused_mode: UpdateMode::reactive(Duration::from_millis(250)),
            unfocused_mode: UpdateMode::reactive_low_power(Duration::from_secs(1)),
        })
        .add_message::<ViewerEvent>()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "roomview".to_string(),
                        resolution: WindowResolution::new(
                            settings.window_width,
                            settings.window_height,
                        ),
                        present_mode: PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: settings.log_filter.clone(),
                    ..default()
                }),
        )
        .insert_resource(settings)
        .add_plugins(EguiPlugin::default())
        .add_systems(
            Startup,
            (setup_room, setup_lighting, setup_camera, start_from_cli).chain(),
        )
        .add_systems(
            Update,
            (
                forward_window_resizes,
                orbit_camera_system,
                poll_model_load,
                redraw_system,
            )
                .chain(),
        )
        .add_systems(EguiPrimaryContextPass, ui_system)
        .run();

    Ok(())
}

fn setup_camera(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    session: Res<ViewerSession>,
) {
    let msaa = if settings.msaa_enabled {
        Msaa::Sample4
    } else {
        Msaa::Off
    };

    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: settings.camera_fov_deg.to_radians(),
            near: settings.camera_near,
            far: settings.camera_far,
            ..default()
        }),
        session.orbit.pose(),
        Tonemapping::AcesFitted,
        msaa,
        ViewerCamera,
    ));
}
