//! Periodic-match propagation onto children.
//!
//! Runs in two collective phases. First, split vertices of matched parents
//! are registered as matches of each other, the same shape of exchange as
//! the remote linker, except that a match may live on this very peer.
//! Second, child edges are paired through their endpoints: once the
//! endpoints of a child edge both have matches on some peer, the matched
//! edge is found there by vertex pair.

use crate::adapt::Adapt;
use crate::refine::Refine;
use adze_mesh::parallel::{pack_words, unpack_words};
use adze_mesh::{Entity, EntityType};

pub(crate) fn match_new_elements(r: &Refine, a: &mut Adapt<'_>) {
    match_split_verts(r, a);
    match_child_edges(r, a);
}

fn match_split_verts(r: &Refine, a: &mut Adapt<'_>) {
    let peers = a.mesh.peers();
    let rank = a.mesh.rank();
    let mut out = vec![Vec::<u64>::new(); peers];
    for dim in 1..a.mesh.dim() {
        for (i, parent) in r.to_split(dim).iter().copied().enumerate() {
            let matches = a.mesh.matches_of(parent).to_vec();
            if matches.is_empty() {
                continue;
            }
            let Some(vert) = r.find_split_vert(a.mesh, dim, i) else {
                continue;
            };
            for (peer, m) in matches {
                if peer == rank {
                    let mv = r
                        .split_vert(a.mesh, m)
                        .expect("matched copy was not split");
                    a.mesh.add_match(vert, rank, mv);
                } else {
                    out[peer].extend_from_slice(&[m.to_word(), vert.to_word()]);
                }
            }
        }
    }
    if peers == 1 {
        return;
    }
    let incoming = a
        .mesh
        .comm()
        .exchange(out.iter().map(|w| pack_words(w)).collect());
    for (from, message) in incoming.iter().enumerate() {
        for pair in unpack_words(message).chunks_exact(2) {
            let parent = Entity::from_word(pair[0]);
            let vert = r
                .split_vert(a.mesh, parent)
                .expect("matched parent has no split vertex");
            a.mesh.add_match(vert, from, Entity::from_word(pair[1]));
        }
    }
}

fn match_child_edges(r: &Refine, a: &mut Adapt<'_>) {
    let peers = a.mesh.peers();
    let rank = a.mesh.rank();
    let mut out = vec![Vec::<u64>::new(); peers];
    for children in r.new_entities(1) {
        for child in children {
            if a.mesh.entity_type(*child) != EntityType::Edge {
                continue;
            }
            let &[x, y] = a.mesh.verts(*child) else { unreachable!() };
            for (peer, mx) in a.mesh.matches_of(x).to_vec() {
                let Some(&(_, my)) = a.mesh.matches_of(y).iter().find(|&&(p, _)| p == peer)
                else {
                    continue;
                };
                if peer == rank {
                    if let Some(m) = a.mesh.find_upward(EntityType::Edge, &[mx, my]) {
                        a.mesh.add_match(*child, rank, m);
                    }
                } else {
                    out[peer].extend_from_slice(&[
                        mx.to_word(),
                        my.to_word(),
                        child.to_word(),
                    ]);
                }
            }
        }
    }
    if peers == 1 {
        return;
    }
    let incoming = a
        .mesh
        .comm()
        .exchange(out.iter().map(|w| pack_words(w)).collect());
    for (from, message) in incoming.iter().enumerate() {
        for triple in unpack_words(message).chunks_exact(3) {
            let verts = [Entity::from_word(triple[0]), Entity::from_word(triple[1])];
            if let Some(edge) = a.mesh.find_upward(EntityType::Edge, &verts) {
                a.mesh.add_match(edge, from, Entity::from_word(triple[2]));
            }
        }
    }
}
