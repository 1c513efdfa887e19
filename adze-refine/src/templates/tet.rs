//! Tetrahedron templates, bisection-only. Canonical frames after rotation,
//! with edges ordered (01, 12, 20, 03, 13, 23):
//! one split edge lies on v0-v1; two adjacent on v0-v1 and v1-v2; two
//! opposite on v0-v1 and v2-v3; a face triple on v0-v1, v1-v2, v2-v0.
//!
//! Wherever a split face leaves a quad, the diagonal is chosen by the same
//! geometric rule the face's own template uses, so region children conform
//! to face children without any cross-talk.

use super::{build_split_element, shorter_diagonal02};
use crate::adapt::Adapt;
use crate::errors::Result;
use crate::refine::Refine;
use adze_mesh::{BuildSink, Entity, EntityType::Tet, Mesh};
use cgmath::MetricSpace;

pub(super) fn split_tet1(
    r: &Refine,
    a: &mut Adapt<'_>,
    region: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = r.split_vert_between(a.mesh, v[0], v[1]);
    build_split_element(a, region, Tet, &[v[0], sv, v[2], v[3]], sink);
    build_split_element(a, region, Tet, &[sv, v[1], v[2], v[3]], sink);
    Ok(())
}

/// Both split edges border the face v0-v1-v2; its three child triangles are
/// coned to v3.
pub(super) fn split_tet2_adjacent(
    r: &Refine,
    a: &mut Adapt<'_>,
    region: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
    ];
    build_split_element(a, region, Tet, &[sv[1], sv[0], v[1], v[3]], sink);
    cone_quad_to_tets(a, region, &[v[0], sv[0], sv[1], v[2]], v[3], sink);
    Ok(())
}

pub(super) fn split_tet2_opposite(
    r: &Refine,
    a: &mut Adapt<'_>,
    region: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[2], v[3]),
    ];
    build_split_element(a, region, Tet, &[v[0], sv[0], v[2], sv[1]], sink);
    build_split_element(a, region, Tet, &[v[0], sv[0], sv[1], v[3]], sink);
    build_split_element(a, region, Tet, &[sv[0], v[1], v[2], sv[1]], sink);
    build_split_element(a, region, Tet, &[sv[0], v[1], sv[1], v[3]], sink);
    Ok(())
}

/// The split face v0-v1-v2 quarters like a triangle with three split edges;
/// each child triangle is coned to v3.
pub(super) fn split_tet3_face(
    r: &Refine,
    a: &mut Adapt<'_>,
    region: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let sv = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
        r.split_vert_between(a.mesh, v[2], v[0]),
    ];
    build_split_element(a, region, Tet, &[sv[0], sv[1], sv[2], v[3]], sink);
    build_split_element(a, region, Tet, &[v[0], sv[0], sv[2], v[3]], sink);
    build_split_element(a, region, Tet, &[v[1], sv[1], sv[0], v[3]], sink);
    build_split_element(a, region, Tet, &[v[2], sv[2], sv[1], v[3]], sink);
    Ok(())
}

/// Uniform split: four corner tetrahedra, then the interior octahedron of
/// mid-edge vertices is cut into four tetrahedra around its shortest
/// diagonal.
pub(super) fn split_tet6(
    r: &Refine,
    a: &mut Adapt<'_>,
    region: Entity,
    v: &[Entity],
    sink: &mut dyn BuildSink,
) -> Result<()> {
    let m = [
        r.split_vert_between(a.mesh, v[0], v[1]),
        r.split_vert_between(a.mesh, v[1], v[2]),
        r.split_vert_between(a.mesh, v[2], v[0]),
        r.split_vert_between(a.mesh, v[0], v[3]),
        r.split_vert_between(a.mesh, v[1], v[3]),
        r.split_vert_between(a.mesh, v[2], v[3]),
    ];
    build_split_element(a, region, Tet, &[v[0], m[0], m[2], m[3]], sink);
    build_split_element(a, region, Tet, &[v[1], m[1], m[0], m[4]], sink);
    build_split_element(a, region, Tet, &[v[2], m[2], m[1], m[5]], sink);
    build_split_element(a, region, Tet, &[v[3], m[3], m[5], m[4]], sink);
    oct_to_tets_geometric(a, region, &m, sink);
    Ok(())
}

/// Cones a quad onto an apex as two tetrahedra, cutting along the same
/// diagonal `quad_to_tris_geometric` would pick for the quad itself.
fn cone_quad_to_tets(
    a: &mut Adapt<'_>,
    region: Entity,
    q: &[Entity; 4],
    apex: Entity,
    sink: &mut dyn BuildSink,
) {
    if shorter_diagonal02(a.mesh, q) {
        build_split_element(a, region, Tet, &[q[0], q[1], q[2], apex], sink);
        build_split_element(a, region, Tet, &[q[2], q[3], q[0], apex], sink);
    } else {
        build_split_element(a, region, Tet, &[q[0], q[1], q[3], apex], sink);
        build_split_element(a, region, Tet, &[q[1], q[2], q[3], apex], sink);
    }
}

/// Tetrahedralizations of the mid-edge octahedron, one row per interior
/// diagonal (m0-m5, m1-m3, m2-m4).
const OCT_TETS: [[[usize; 4]; 4]; 3] = [
    [[0, 1, 2, 5], [0, 2, 3, 5], [0, 3, 4, 5], [0, 4, 1, 5]],
    [[1, 0, 4, 3], [1, 4, 5, 3], [1, 5, 2, 3], [1, 2, 0, 3]],
    [[2, 0, 1, 4], [2, 1, 5, 4], [2, 5, 3, 4], [2, 3, 0, 4]],
];

fn oct_to_tets_geometric(
    a: &mut Adapt<'_>,
    region: Entity,
    m: &[Entity; 6],
    sink: &mut dyn BuildSink,
) {
    let diagonal = shortest_oct_diagonal(a.mesh, m);
    for tet in &OCT_TETS[diagonal] {
        let verts = tet.map(|i| m[i]);
        build_split_element(a, region, Tet, &verts, sink);
    }
}

/// Index of the shortest of the three interior diagonals; an exact tie goes
/// to the lowest index. The choice is private to one region, so no
/// cross-element agreement is at stake.
fn shortest_oct_diagonal(mesh: &Mesh, m: &[Entity; 6]) -> usize {
    let length2 = |i: usize, j: usize| mesh.point(m[i]).distance2(mesh.point(m[j]));
    let lengths = [length2(0, 5), length2(1, 3), length2(2, 4)];
    (0..3).fold(0, |best, i| match lengths[i] < lengths[best] {
        true => i,
        false => best,
    })
}
