use adze_mesh::{Entity, Mesh, Vector3};

/// The size-field oracle: decides which edges are too long and where along
/// their parameter the split vertex goes.
pub trait SizeField {
    /// Whether this edge should be bisected in the coming sweep.
    fn should_split(&mut self, mesh: &Mesh, edge: Entity) -> bool;

    /// Parameter of the split vertex along the edge, in `[0, 1]` measured
    /// from the edge's first vertex. Values outside the interval are a
    /// contract violation and abort the sweep.
    fn place_split(&mut self, mesh: &Mesh, edge: Entity) -> f64 { let _ = (mesh, edge); 0.5 }

    /// Defines this oracle's own per-vertex data on a new vertex created at
    /// local coordinate `xi` of `parent` (an anisotropic frame, a target
    /// length, …). Called once per new vertex.
    fn interpolate(&mut self, mesh: &mut Mesh, parent: Entity, xi: Vector3, vert: Entity) {
        let _ = (mesh, parent, xi, vert);
    }

    /// Lowest entity dimension whose children this oracle wants reported.
    /// The default requests nothing beyond what other collaborators ask for.
    fn transfer_dimension(&self) -> usize { 4 }
}

/// Splits every edge at its midpoint; one sweep of this is uniform
/// refinement.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSizeField;

impl SizeField for UniformSizeField {
    fn should_split(&mut self, _: &Mesh, _: Entity) -> bool { true }
}
