//! Two-peer sweeps driven in lockstep on threads.

mod common;

use adze_mesh::*;
use adze_refine::*;
use common::*;
use std::sync::Arc;

fn edge_between(mesh: &Mesh, v0: Entity, v1: Entity) -> Entity {
    mesh.find_upward(EntityType::Edge, &[v0, v1]).unwrap()
}

/// Each peer holds one triangle; the edge from (0,0,0) to (1,0,0) is shared.
/// Both peers create their entities in the same order, so remote handles
/// mirror local ones.
fn shared_edge_triangle(comm: LocalComm) -> (Mesh, Entity, Entity, Entity) {
    let rank = comm.rank();
    let other = 1 - rank;
    let mut mesh = Mesh::with_comm(2, Arc::new(comm));
    let surface = ModelEntity::new(2, 0);
    let s0 = vert(&mut mesh, surface, 0.0, 0.0, 0.0);
    let s1 = vert(&mut mesh, surface, 1.0, 0.0, 0.0);
    let own = vert(&mut mesh, surface, 0.5, if rank == 0 { 1.0 } else { -1.0 }, 0.0);
    match rank {
        0 => mesh.create_element(surface, EntityType::Tri, &[s0, s1, own]),
        _ => mesh.create_element(surface, EntityType::Tri, &[s1, s0, own]),
    };
    mesh.add_remote(s0, other, s0);
    mesh.add_remote(s1, other, s1);
    let spine = edge_between(&mesh, s0, s1);
    mesh.add_remote(spine, other, spine);
    (mesh, s0, s1, spine)
}

/// Both peers mark the shared edge: the split vertices must be mutually
/// registered as remote copies, and the child edges restitched.
#[test]
fn linked_split_vertices_agree_across_peers() {
    let handles: Vec<_> = LocalComm::group(2)
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let (mut mesh, s0, s1, spine) = shared_edge_triangle(comm);
                let other = 1 - mesh.rank();
                let mut size = MarkEdges::at_midpoints(vec![spine]);
                assert!(run(&mut mesh, &mut size).unwrap());

                assert_eq!(mesh.count(2), 2);
                assert_eq!(mesh.count(0), 4);
                let sv = find_vertex_at(&mesh, 0.5, 0.0, 0.0).expect("linked split vertex");
                // identical creation order on both peers: the remote handle
                // mirrors the local one
                assert_eq!(mesh.remotes(sv), &[(other, sv)]);
                for child in [edge_between(&mesh, s0, sv), edge_between(&mesh, sv, s1)] {
                    assert_eq!(mesh.remotes(child).len(), 1, "child edge not stitched");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

/// Only one peer's size field wants any splitting, and only of a private
/// edge of its quad. Mark completion promotes the quad to its full pattern,
/// the promoted shared edge reaches the other peer over the bus, and the
/// other peer's quad promotes in turn: both peers refine fully.
#[test]
fn mark_completion_reaches_the_fixpoint_across_peers() {
    let handles: Vec<_> = LocalComm::group(2)
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let rank = comm.rank();
                let other = 1 - rank;
                let mut mesh = Mesh::with_comm(2, Arc::new(comm));
                let surface = ModelEntity::new(2, 0);
                let s0 = vert(&mut mesh, surface, 0.0, 0.0, 0.0);
                let s1 = vert(&mut mesh, surface, 1.0, 0.0, 0.0);
                let (a, b) = match rank {
                    0 => (
                        vert(&mut mesh, surface, 1.0, 1.0, 0.0),
                        vert(&mut mesh, surface, 0.0, 1.0, 0.0),
                    ),
                    _ => (
                        vert(&mut mesh, surface, 0.0, -1.0, 0.0),
                        vert(&mut mesh, surface, 1.0, -1.0, 0.0),
                    ),
                };
                match rank {
                    0 => mesh.create_element(surface, EntityType::Quad, &[s0, s1, a, b]),
                    _ => mesh.create_element(surface, EntityType::Quad, &[s1, s0, a, b]),
                };
                mesh.add_remote(s0, other, s0);
                mesh.add_remote(s1, other, s1);
                let spine = edge_between(&mesh, s0, s1);
                mesh.add_remote(spine, other, spine);

                // rank 0 marks one private edge; rank 1 marks nothing
                let mut size = MarkEdges::at_midpoints(match rank {
                    0 => vec![edge_between(&mesh, a, b)],
                    _ => Vec::new(),
                });
                assert!(run(&mut mesh, &mut size).unwrap());

                assert_eq!(mesh.count(2), 4, "completion must reach both peers");
                let sv = find_vertex_at(&mesh, 0.5, 0.0, 0.0).expect("shared split vertex");
                assert_eq!(mesh.remotes(sv), &[(other, sv)]);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

/// A sweep where neither peer marks anything returns false on both.
#[test]
fn empty_sweep_is_collectively_empty() {
    let handles: Vec<_> = LocalComm::group(2)
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let (mut mesh, ..) = shared_edge_triangle(comm);
                assert!(!run(&mut mesh, &mut MarkNothing).unwrap());
                assert_eq!(mesh.count(2), 1);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

/// One peer's oracle marks the shared edge, the other's does not; the mark
/// is mirrored over the bus before the consistency check, so both peers
/// split it identically.
#[test]
fn one_sided_marking_of_a_shared_edge_converges() {
    let handles: Vec<_> = LocalComm::group(2)
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let (mut mesh, _, _, spine) = shared_edge_triangle(comm);
                let mut size = MarkEdges::at_midpoints(match mesh.rank() {
                    0 => vec![spine],
                    _ => Vec::new(),
                });
                assert!(run(&mut mesh, &mut size).unwrap());
                assert_eq!(mesh.count(2), 2);
                assert!(find_vertex_at(&mesh, 0.5, 0.0, 0.0).is_some());
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
