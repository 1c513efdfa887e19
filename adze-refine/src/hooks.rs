use crate::Refine;
use adze_mesh::Mesh;

/// Boundary-layer hook, for meshes carrying extruded layer stacks whose
/// refinement is coordinated outside the core sweep. Both operations default
/// to doing nothing.
pub trait LayerHook {
    /// Requests collection of child entities at extra dimensions.
    fn collect(&mut self, should_collect: &mut [bool; 4]) { let _ = should_collect; }

    /// Flags freshly created layer entities before the old elements are
    /// destroyed.
    fn flag_new_entities(&mut self, mesh: &mut Mesh, refine: &Refine) {
        let _ = (mesh, refine);
    }
}

/// Post-sweep snapping hook: repositions new boundary vertices onto the
/// geometric model. The core stamps each split vertex with its model
/// classification and interpolated parameters so a snapper has everything it
/// needs.
pub trait Snapper {
    /// Moves vertices onto the model.
    fn snap(&mut self, mesh: &mut Mesh);
}
