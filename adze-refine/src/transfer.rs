use adze_mesh::{DblTag, Entity, Mesh, Vector3};
use cgmath::VectorSpace;

/// Solution-transfer hook: keeps per-vertex and per-element solution data
/// defined across a sweep.
pub trait SolutionTransfer {
    /// Lowest entity dimension whose `on_refine` this transfer needs.
    fn transfer_dimension(&self) -> usize { 4 }

    /// Defines solution values on a vertex created at local coordinate `xi`
    /// of `parent`.
    fn on_vertex(&mut self, mesh: &mut Mesh, parent: Entity, xi: Vector3, vert: Entity) {
        let _ = (mesh, parent, xi, vert);
    }

    /// Transfers element-attached data from a split parent onto its
    /// children.
    fn on_refine(&mut self, mesh: &mut Mesh, parent: Entity, children: &[Entity]) {
        let _ = (mesh, parent, children);
    }
}

/// Shape-handler hook: maintains the geometric shape representation of
/// elements (curved edges, high-order nodes) across a sweep. Same surface as
/// [`SolutionTransfer`]; linear meshes need none of it.
pub trait ShapeHandler {
    /// Lowest entity dimension whose `on_refine` this handler needs.
    fn transfer_dimension(&self) -> usize { 4 }

    /// Defines shape data on a new vertex.
    fn on_vertex(&mut self, mesh: &mut Mesh, parent: Entity, xi: Vector3, vert: Entity) {
        let _ = (mesh, parent, xi, vert);
    }

    /// Transfers shape data from a split parent onto its children.
    fn on_refine(&mut self, mesh: &mut Mesh, parent: Entity, children: &[Entity]) {
        let _ = (mesh, parent, children);
    }
}

/// Transfer for meshes carrying no solution.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransfer;

impl SolutionTransfer for NullTransfer {}

/// Shape handler for straight-sided meshes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullShape;

impl ShapeHandler for NullShape {}

/// Linear transfer of one scalar vertex field stored in a double tag.
///
/// New vertices get the field interpolated linearly over the parent's
/// vertices; element-attached data does not exist for a vertex field, so
/// `on_refine` is not requested.
#[derive(Clone, Copy, Debug)]
pub struct LinearFieldTransfer {
    tag: DblTag,
}

impl LinearFieldTransfer {
    /// Transfers the field stored under `tag`.
    pub fn new(tag: DblTag) -> Self { LinearFieldTransfer { tag } }
}

impl SolutionTransfer for LinearFieldTransfer {
    fn on_vertex(&mut self, mesh: &mut Mesh, parent: Entity, xi: Vector3, vert: Entity) {
        let value = match mesh.entity_type(parent).dim() {
            1 => {
                let t = (xi.x + 1.0) / 2.0;
                let &[v0, v1] = mesh.verts(parent) else { unreachable!() };
                let f0 = mesh.dbl(v0, self.tag).unwrap_or(0.0);
                let f1 = mesh.dbl(v1, self.tag).unwrap_or(0.0);
                f0 * (1.0 - t) + f1 * t
            }
            // face and region interiors only ever receive centroid vertices
            _ => {
                let vs = mesh.verts(parent);
                let sum: f64 = vs.iter().map(|&v| mesh.dbl(v, self.tag).unwrap_or(0.0)).sum();
                sum / vs.len() as f64
            }
        };
        mesh.set_dbl(vert, self.tag, value);
    }
}

/// Linear interpolation of endpoint model parameters onto a split vertex,
/// used when parametric transfer is enabled.
pub(crate) fn parametric_on_edge_split(mesh: &Mesh, edge: Entity, place: f64) -> Vector3 {
    let &[v0, v1] = mesh.verts(edge) else { unreachable!() };
    mesh.param(v0).lerp(mesh.param(v1), place)
}
