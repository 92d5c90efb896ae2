use quasar_ecs::Component;

/// Mesh and material asset references. Resolved by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Component)]
pub struct MeshRenderer {
    pub mesh: String,
    pub material: String,
}

impl MeshRenderer {
    pub fn new(mesh: &str, material: &str) -> Self {
        Self {
            mesh: mesh.to_string(),
            material: material.to_string(),
        }
    }

    /// A renderer with no mesh or no material draws nothing.
    pub fn is_drawable(&self) -> bool {
        !self.mesh.is_empty() && !self.material.is_empty()
    }
}
