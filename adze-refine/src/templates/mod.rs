//! Table-driven element splitting.
//!
//! Each splittable type owns a small set of canonical templates; the
//! [`tables`] module maps every edge-split bitmask to one of them plus the
//! rigid rotation bringing the element's vertices into the template's frame.
//! Vertex orderings inside the templates fix the handedness of the children
//! and are load-bearing: a reordered tuple produces inverted or
//! non-conforming elements.

use crate::adapt::{Adapt, SPLIT};
use crate::errors::Result;
use crate::refine::Refine;
use adze_mesh::{BuildSink, Entity, EntityType, Mesh};
use cgmath::MetricSpace;
use smallvec::SmallVec;

pub(crate) mod tables;

mod quad;
mod tet;
mod tri;

pub(crate) type SplitFn =
    fn(&Refine, &mut Adapt<'_>, Entity, &[Entity], &mut dyn BuildSink) -> Result<()>;

fn split_none(_: &Refine, _: &mut Adapt<'_>, e: Entity, _: &[Entity], _: &mut dyn BuildSink) -> Result<()> {
    unreachable!("split dispatched on {e:?} with an empty edge mask")
}

static EDGE_TEMPLATES: &[SplitFn] = &[split_none, split_edge];
static TRI_TEMPLATES: &[SplitFn] = &[split_none, tri::split_tri1, tri::split_tri2, tri::split_tri3];
static QUAD_TEMPLATES: &[SplitFn] = &[split_none, quad::split_quad2, quad::split_quad4];
static TET_TEMPLATES: &[SplitFn] = &[
    split_none,
    tet::split_tet1,
    tet::split_tet2_adjacent,
    tet::split_tet2_opposite,
    tet::split_tet3_face,
    tet::split_tet6,
];

fn templates(etype: EntityType) -> Option<&'static [SplitFn]> {
    use EntityType::*;
    match etype {
        Edge => Some(EDGE_TEMPLATES),
        Tri => Some(TRI_TEMPLATES),
        Quad => Some(QUAD_TEMPLATES),
        Tet => Some(TET_TEMPLATES),
        _ => None,
    }
}

/// Bitmask of the element's marked boundary edges, aligned with
/// [`EntityType::edge_verts`].
pub(crate) fn edge_split_mask(a: &Adapt<'_>, e: Entity) -> usize {
    a.mesh
        .down_edges(e)
        .iter()
        .enumerate()
        .fold(0, |mask, (i, &edge)| match a.get_flag(edge, SPLIT) {
            true => mask | 1 << i,
            false => mask,
        })
}

/// Splits one element: look up the template for its mask, rotate the vertex
/// tuple into the canonical frame, dispatch.
pub(crate) fn split_element(
    r: &Refine,
    a: &mut Adapt<'_>,
    e: Entity,
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let etype = a.mesh.entity_type(e);
    let mask = edge_split_mask(a, e);
    let entry = tables::code_match(etype)
        .and_then(|table| table[mask])
        .unwrap_or_else(|| panic!("no template for {etype:?} mask {mask:#b} after completion"));
    let p = tables::rotations(etype)[entry.rotation];
    let stored = a.mesh.verts(e);
    let v: SmallVec<[Entity; 8]> = p.iter().map(|&i| stored[i]).collect();
    templates(etype).unwrap()[entry.template](r, a, e, &v, sink)
}

/// Builds one child, classified on the parent's model entity.
pub(crate) fn build_split_element(
    a: &mut Adapt<'_>,
    parent: Entity,
    etype: EntityType,
    verts: &[Entity],
    sink: &mut dyn BuildSink,
) -> Entity {
    let model = a.mesh.model(parent);
    a.mesh.build_element(model, etype, verts, sink)
}

fn split_edge(
    r: &Refine,
    a: &mut Adapt<'_>,
    edge: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = r.make_split_vert(a, edge, sink)?;
    build_split_element(a, edge, EntityType::Edge, &[v[0], sv], sink);
    build_split_element(a, edge, EntityType::Edge, &[sv, v[1]], sink);
    Ok(())
}

/// Whether the v0-v2 diagonal of the quad `q` is the one to cut along.
///
/// The shorter diagonal wins; an exact tie falls back to comparing the
/// diagonals' endpoint coordinates, so that every element and every peer
/// looking at the same four points makes the same choice regardless of which
/// rotation of the quad it sees.
pub(crate) fn shorter_diagonal02(mesh: &Mesh, q: &[Entity; 4]) -> bool {
    let p: Vec<_> = q.iter().map(|&v| mesh.point(v)).collect();
    let d02 = p[0].distance2(p[2]);
    let d13 = p[1].distance2(p[3]);
    if d02 != d13 {
        return d02 < d13;
    }
    let key = |i: usize, j: usize| {
        let (a, b): ([f64; 3], [f64; 3]) = (p[i].into(), p[j].into());
        match a < b {
            true => (a, b),
            false => (b, a),
        }
    };
    key(0, 2) <= key(1, 3)
}

/// Cuts a quad into two triangles along the geometrically chosen diagonal,
/// keeping the quad's orientation.
pub(crate) fn quad_to_tris_geometric(
    a: &mut Adapt<'_>,
    parent: Entity,
    q: &[Entity; 4],
    sink: &mut dyn BuildSink,
) {
    use EntityType::Tri;
    if shorter_diagonal02(a.mesh, q) {
        build_split_element(a, parent, Tri, &[q[0], q[1], q[2]], sink);
        build_split_element(a, parent, Tri, &[q[2], q[3], q[0]], sink);
    } else {
        build_split_element(a, parent, Tri, &[q[0], q[1], q[3]], sink);
        build_split_element(a, parent, Tri, &[q[1], q[2], q[3]], sink);
    }
}
