//! Quad templates, bisection-only: either one opposite pair of edges is
//! split (two child quads) or all four are (four child quads around a new
//! centroid vertex). Other patterns are promoted to the full mask by mark
//! completion before splitting begins.

use super::build_split_element;
use crate::adapt::Adapt;
use crate::errors::Result;
use crate::refine::Refine;
use adze_mesh::{BuildSink, Entity, EntityType::Quad};

/// Canonical frame: the split edges are v0-v1 and v2-v3.
pub(super) fn split_quad2(
    r: &Refine,
    a: &mut Adapt<'_>,
    face: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[2], v[3]),
    ];
    build_split_element(a, face, Quad, &[v[0], sv[0], sv[1], v[3]], sink);
    build_split_element(a, face, Quad, &[sv[0], v[1], v[2], sv[1]], sink);
    Ok(())
}

pub(super) fn split_quad4(
    r: &Refine,
    a: &mut Adapt<'_>,
    face: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
        r.split_vert_between(a.mesh, v[2], v[3]),
        r.split_vert_between(a.mesh, v[3], v[0]),
    ];
    let cv = r.make_centroid_vert(a, face, sink);
    build_split_element(a, face, Quad, &[v[0], sv[0], cv, sv[3]], sink);
    build_split_element(a, face, Quad, &[v[1], sv[1], cv, sv[0]], sink);
    build_split_element(a, face, Quad, &[v[2], sv[2], cv, sv[1]], sink);
    build_split_element(a, face, Quad, &[v[3], sv[3], cv, sv[2]], sink);
    Ok(())
}
