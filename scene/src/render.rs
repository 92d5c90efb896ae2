//! Renderer seam.

use quasar_core::math::{Mat4, Vec3};
use quasar_ecs::Entity;

use crate::components::{Camera, MeshRenderer};

/// Point light with its world position, refreshed once per render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLightData {
    pub entity: Entity,
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

/// Camera with its view matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub entity: Entity,
    pub position: Vec3,
    /// World-to-view transform (scale ignored).
    pub view: Mat4,
    pub camera: Camera,
}

/// Receives one frame of draw submissions from
/// [`Scene::on_render`](crate::Scene::on_render).
pub trait RenderSink {
    fn begin_scene(&mut self, camera: Option<&CameraView>, point_lights: &[PointLightData]);

    fn submit(&mut self, entity: Entity, transform: &Mat4, mesh: &MeshRenderer);

    fn end_scene(&mut self) {}
}
