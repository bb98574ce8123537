use crate::viewer::ROOM_PANEL_SUBDIVISIONS;
use crate::viewer::settings::ViewerSettings;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Floor,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomPanel {
    pub name: &'static str,
    pub kind: PanelKind,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl RoomPanel {
    /// Visible side of the panel. Planes are built facing +Y.
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Floor, ceiling and four walls of a cube room resting on y = 0, all
/// facing inwards.
pub fn room_panels(wall_size: f32) -> [RoomPanel; 6] {
    let half = 0.5 * wall_size;
    [
        RoomPanel {
            name: "Floor",
            kind: PanelKind::Floor,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        },
        RoomPanel {
            name: "Ceiling",
            kind: PanelKind::Wall,
            translation: Vec3::new(0.0, wall_size, 0.0),
            rotation: Quat::from_rotation_x(PI),
        },
        RoomPanel {
            name: "Wall +X",
            kind: PanelKind::Wall,
            translation: Vec3::new(half, half, 0.0),
            rotation: Quat::from_rotation_z(FRAC_PI_2),
        },
        RoomPanel {
            name: "Wall -X",
            kind: PanelKind::Wall,
            translation: Vec3::new(-half, half, 0.0),
            rotation: Quat::from_rotation_z(-FRAC_PI_2),
        },
        RoomPanel {
            name: "Wall +Z",
            kind: PanelKind::Wall,
            translation: Vec3::new(0.0, half, half),
            rotation: Quat::from_rotation_x(-FRAC_PI_2),
        },
        RoomPanel {
            name: "Wall -Z",
            kind: PanelKind::Wall,
            translation: Vec3::new(0.0, half, -half),
            rotation: Quat::from_rotation_x(FRAC_PI_2),
        },
    ]
}

pub fn setup_room(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ViewerSettings>,
) {
    let panel_mesh = meshes.add(
        Plane3d::default()
            .mesh()
            .size(settings.wall_size, settings.wall_size)
            .subdivisions(ROOM_PANEL_SUBDIVISIONS),
    );

    let wall_mat = materials.add(StandardMaterial {
        base_color: settings.wall_color(),
        perceptual_roughness: 0.9,
        ..default()
    });
    let floor_mat = materials.add(StandardMaterial {
        base_color: settings.floor_color(),
        perceptual_roughness: 0.95,
        ..default()
    });

    for panel in room_panels(settings.wall_size) {
        let material = match panel.kind {
            PanelKind::Floor => floor_mat.clone(),
            PanelKind::Wall => wall_mat.clone(),
        };

        commands.spawn((
            Name::new(panel.name),
            Mesh3d(panel_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(panel.translation).with_rotation(panel.rotation),
            NotShadowCaster,
        ));
    }
}
