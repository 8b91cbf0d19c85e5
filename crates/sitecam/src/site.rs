//! Scene population: ground and lights, camera rigs, loaded models.

use sitecam_core::{
    CameraId, Light, LoadedAsset, LogicalCamera, ObjectId, SceneConfig, SceneGraph, SceneObject,
    Transform,
};

/// A scene holding only the ground plane and the lights.
pub fn base_scene(config: &SceneConfig) -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.add_object(SceneObject::ground(config.ground_size, config.ground_color));
    scene.add_light(Light::Directional {
        position: config.light_position,
        color: config.light_color,
        intensity: config.light_intensity,
    });
    scene.add_light(Light::Ambient {
        color: config.ambient_color,
    });
    scene
}

/// Adds camera rigs; their FOV volumes come with them.
pub fn add_cameras(
    scene: &mut SceneGraph,
    cameras: impl IntoIterator<Item = LogicalCamera>,
) -> Vec<CameraId> {
    cameras
        .into_iter()
        .map(|camera| {
            log::debug!(
                "camera rig {} at {} ({} deg)",
                camera.name(),
                camera.position(),
                camera.lens_fov()
            );
            scene.add_camera(camera)
        })
        .collect()
}

/// Places loaded models along the sample layout, in load order.
pub fn place_assets(
    scene: &mut SceneGraph,
    assets: Vec<LoadedAsset>,
    config: &SceneConfig,
) -> Vec<ObjectId> {
    assets
        .into_iter()
        .enumerate()
        .map(|(index, asset)| {
            let position = SceneGraph::sample_layout(index, config);
            scene.add_object(SceneObject::model(
                asset.identifier,
                asset.mesh,
                Transform::from_position(position),
            ))
        })
        .collect()
}
