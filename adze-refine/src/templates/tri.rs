//! Triangle templates. Canonical frames after rotation: one split edge lies
//! on v0-v1; two split edges lie on v0-v1 and v1-v2.

use super::{build_split_element, quad_to_tris_geometric};
use crate::adapt::Adapt;
use crate::errors::Result;
use crate::refine::Refine;
use adze_mesh::{BuildSink, Entity, EntityType::Tri};

pub(super) fn split_tri1(
    r: &Refine,
    a: &mut Adapt<'_>,
    face: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = r.split_vert_between(a.mesh, v[0], v[1]);
    build_split_element(a, face, Tri, &[v[0], sv, v[2]], sink);
    build_split_element(a, face, Tri, &[v[2], sv, v[1]], sink);
    Ok(())
}

/// The corner triangle at v1 comes off directly; the remaining quad is cut
/// along its geometrically shorter diagonal.
pub(super) fn split_tri2(
    r: &Refine,
    a: &mut Adapt<'_>,
    face: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
    ];
    build_split_element(a, face, Tri, &[sv[1], sv[0], v[1]], sink);
    quad_to_tris_geometric(a, face, &[v[0], sv[0], sv[1], v[2]], sink);
    Ok(())
}

pub(super) fn split_tri3(
    r: &Refine,
    a: &mut Adapt<'_>,
    face: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
        r.split_vert_between(a.mesh, v[2], v[0]),
    ];
    build_split_element(a, face, Tri, &[sv[0], sv[1], sv[2]], sink);
    build_split_element(a, face, Tri, &[v[0], sv[0], sv[2]], sink);
    build_split_element(a, face, Tri, &[v[1], sv[1], sv[0]], sink);
    build_split_element(a, face, Tri, &[v[2], sv[2], sv[1]], sink);
    Ok(())
}
