use crate::viewer::camera::ViewerCamera;
use crate::viewer::error::{Result, ViewerError};
use crate::viewer::frame_fit::BoundingVolume;
use crate::viewer::session::{ViewerEvent, ViewerSession};
use bevy::asset::RecursiveDependencyLoadState;
use bevy::camera::primitives::Aabb;
use bevy::gltf::GltfAssetLabel;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use bevy::scene::{SceneInstance, SceneSpawner};
use tracing::{error, info, warn};

#[derive(Component)]
pub struct ViewerModel;

/// URL handed over on the command line, consumed once at startup.
#[derive(Resource, Default)]
pub struct StartupRequest {
    pub url: Option<String>,
}

#[derive(Debug, Default)]
pub enum ModelSlot {
    #[default]
    Idle,
    Loading {
        url: String,
        handle: Handle<Scene>,
        root: Entity,
    },
    Ready {
        url: String,
        bounds: BoundingVolume,
    },
    Failed {
        url: String,
        reason: String,
    },
}

impl ModelSlot {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn bounds(&self) -> Option<&BoundingVolume> {
        match self {
            Self::Ready { bounds, .. } => Some(bounds),
            _ => None,
        }
    }

    pub fn status_line(&self) -> String {
        match self {
            Self::Idle => "No model loaded".to_string(),
            Self::Loading { url, .. } => format!("Loading {url}..."),
            Self::Ready { url, bounds, .. } => {
                let size = bounds.size();
                format!(
                    "{url} ({:.2} x {:.2} x {:.2})",
                    size.x, size.y, size.z
                )
            }
            Self::Failed { url, reason } => format!("Failed to load {url}: {reason}"),
        }
    }
}

/// Depth-first, pre-order walk over a tree given by `children`. Children are
/// visited in the order `children` yields them.
pub fn visit_subtree<N, I>(root: N, mut children: impl FnMut(N) -> I, mut visit: impl FnMut(N))
where
    N: Copy,
    I: IntoIterator<Item = N>,
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        let first_child = stack.len();
        stack.extend(children(node));
        stack[first_child..].reverse();
    }
}

/// Translation that centres the model's footprint on the origin and rests it
/// on the floor.
pub fn recenter_offset(bounds: &BoundingVolume) -> Vec3 {
    let size = bounds.size();
    Vec3::new(
        -bounds.min.x - 0.5 * size.x,
        -bounds.min.y,
        -bounds.min.z - 0.5 * size.z,
    )
}

/// Orbit pivot for a recentred model: halfway up its height, above the origin.
pub fn view_target(bounds: &BoundingVolume) -> Vec3 {
    Vec3::new(0.0, 0.5 * bounds.size().y, 0.0)
}

pub fn world_box(aabb: &Aabb, transform: &GlobalTransform) -> BoundingVolume {
    let center = Vec3::from(aabb.center);
    let half = Vec3::from(aabb.half_extents);
    let local = BoundingVolume::new(center - half, center + half);
    BoundingVolume::from_points(local.corners().map(|corner| transform.transform_point(corner)))
        .unwrap_or(local)
}

pub fn start_viewing(
    url: &str,
    commands: &mut Commands,
    asset_server: &AssetServer,
    session: &mut ViewerSession,
) -> Result<bool> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ViewerError::EmptyUrl);
    }
    if !session.model.is_idle() {
        warn!("ignoring request to view '{url}', a model was already requested");
        return Ok(false);
    }

    let handle: Handle<Scene> =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(url.to_string()));
    let root = commands
        .spawn((
            Name::new("Model"),
            SceneRoot(handle.clone()),
            Transform::IDENTITY,
            Visibility::Hidden,
            ViewerModel,
        ))
        .id();

    info!("loading model from {url}");
    session.model = ModelSlot::Loading {
        url: url.to_string(),
        handle,
        root,
    };
    Ok(true)
}

pub fn start_from_cli(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut request: ResMut<StartupRequest>,
    mut session: ResMut<ViewerSession>,
) {
    let Some(url) = request.url.take() else {
        return;
    };
    if let Err(err) = start_viewing(&url, &mut commands, &asset_server, &mut session) {
        error!("{err}");
    }
}

/// Where an accepted model was placed and what the camera should orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedModel {
    pub offset: Vec3,
    pub bounds: BoundingVolume,
    pub target: Vec3,
}

/// Records a failed load. The auto-fit stays unarmed.
pub fn fail_model(session: &mut ViewerSession, url: String, reason: String) -> ViewerError {
    let err = ViewerError::ModelLoad {
        url: url.clone(),
        reason: reason.clone(),
    };
    session.model = ModelSlot::Failed { url, reason };
    err
}

/// Recentres a loaded model with world-space `bounds`, points the orbit at
/// it and arms the one-shot fit.
pub fn accept_model(session: &mut ViewerSession, url: String, bounds: BoundingVolume) -> PlacedModel {
    let offset = recenter_offset(&bounds);
    let fitted = bounds.translated(offset);
    if fitted.is_degenerate() {
        warn!("model at {url} has a degenerate bounding box");
    }

    let target = view_target(&fitted);
    session.orbit.set_target(target);
    session.driver.model_ready(fitted, target);
    session.model = ModelSlot::Ready {
        url,
        bounds: fitted,
    };

    PlacedModel {
        offset,
        bounds: fitted,
        target,
    }
}

pub fn poll_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    scene_spawner: Res<SceneSpawner>,
    mut session: ResMut<ViewerSession>,
    instances: Query<&SceneInstance>,
    children: Query<&Children>,
    meshes: Query<Option<&Aabb>, With<Mesh3d>>,
    globals: Query<&GlobalTransform>,
    mut model_query: Query<
        (&mut Transform, &mut Visibility),
        (With<ViewerModel>, Without<ViewerCamera>),
    >,
    mut camera_query: Query<&mut Transform, (With<ViewerCamera>, Without<ViewerModel>)>,
    mut events: MessageWriter<ViewerEvent>,
) {
    let ModelSlot::Loading { url, handle, root } = &session.model else {
        return;
    };
    let (url, root, scene_id) = (url.clone(), *root, handle.id());

    match asset_server.recursive_dependency_load_state(scene_id) {
        RecursiveDependencyLoadState::Loaded => {}
        RecursiveDependencyLoadState::Failed(err) => {
            let err = fail_model(&mut session, url, err.to_string());
            error!("{err}");
            commands.entity(root).despawn();
            return;
        }
        _ => return,
    }

    let Ok(instance) = instances.get(root) else {
        return;
    };
    if !scene_spawner.instance_is_ready(**instance) {
        return;
    }

    let mut nodes = Vec::new();
    visit_subtree(
        root,
        |entity| {
            children
                .get(entity)
                .map(|c| c.to_vec())
                .unwrap_or_default()
        },
        |entity| nodes.push(entity),
    );

    let mut bounds: Option<BoundingVolume> = None;
    for &node in &nodes {
        match meshes.get(node) {
            Ok(Some(aabb)) => {
                let Ok(global) = globals.get(node) else {
                    return;
                };
                let mesh_box = world_box(aabb, global);
                bounds = Some(bounds.map_or(mesh_box, |b| b.union(&mesh_box)));
            }
            // Bounds are computed after spawn; try again next frame.
            Ok(None) => return,
            Err(_) => {}
        }
    }
    let bounds = bounds.unwrap_or(BoundingVolume::new(Vec3::ZERO, Vec3::ZERO));

    let placed = accept_model(&mut session, url, bounds);
    if let Ok((mut transform, mut visibility)) = model_query.get_mut(root) {
        transform.translation = placed.offset;
        *visibility = Visibility::Inherited;
    }
    for &node in &nodes {
        commands
            .entity(node)
            .remove::<(NotShadowCaster, NotShadowReceiver)>();
    }
    for mut transform in &mut camera_query {
        *transform = session.orbit.pose();
    }

    info!(
        "model ready: {} nodes, bounds {} .. {}",
        nodes.len(),
        placed.bounds.min,
        placed.bounds.max
    );
    events.write(ViewerEvent::ModelReady);
}
