//! Edge marking: the size-field pass, the collective mark-completion loop,
//! and the cross-peer flag-consistency check.

use crate::adapt::{Adapt, DONT_SPLIT, SPLIT};
use crate::errors::{Error, Result};
use crate::templates::{edge_split_mask, tables};
use adze_mesh::parallel::{pack_words, unpack_words};
use adze_mesh::Entity;

/// Marks every edge the size field selects, completes the marks so that
/// every element mask lands on a supported template, and returns the global
/// marked-edge count. Collective.
pub(crate) fn mark_edges_to_split(a: &mut Adapt<'_>) -> Result<i64> {
    let edges: Vec<Entity> = a.mesh.iter(1).collect();
    for e in edges {
        match a.size_field.should_split(a.mesh, e) {
            true => {
                a.set_flag(e, SPLIT);
                a.clear_flag(e, DONT_SPLIT);
            }
            false => {
                a.set_flag(e, DONT_SPLIT);
                a.clear_flag(e, SPLIT);
            }
        }
    }
    complete_marks(a)?;
    let local = a.mesh.iter(1).filter(|&e| a.get_flag(e, SPLIT)).count() as i64;
    Ok(a.mesh.comm().add_i64(local))
}

/// Fixpoint loop closing the marked set over the template tables: an element
/// whose mask no rotation can canonicalize gets all of its edges marked.
/// Newly marked shared or matched edges are mirrored to their copies each
/// round; the loop ends when no peer changed anything.
fn complete_marks(a: &mut Adapt<'_>) -> Result<()> {
    loop {
        let mut changed = promote_unsupported_masks(a)?;
        if a.options.should_handle_matching {
            changed += mirror_marks_to_local_matches(a);
        }
        changed += sync_marks(a);
        if a.mesh.comm().add_i64(changed) == 0 {
            return Ok(());
        }
    }
}

fn promote_unsupported_masks(a: &mut Adapt<'_>) -> Result<i64> {
    let mut changed = 0;
    for dim in 2..=a.mesh.dim() {
        let elements: Vec<Entity> = a.mesh.iter(dim).collect();
        for e in elements {
            let etype = a.mesh.entity_type(e);
            let mask = edge_split_mask(a, e);
            if mask == 0 {
                continue;
            }
            let Some(table) = tables::code_match(etype) else {
                return Err(Error::UnsupportedElement(etype));
            };
            if table[mask].is_none() {
                for edge in a.mesh.down_edges(e) {
                    if !a.get_flag(edge, SPLIT) {
                        a.set_flag(edge, SPLIT);
                        a.clear_flag(edge, DONT_SPLIT);
                        changed += 1;
                    }
                }
            }
        }
    }
    Ok(changed)
}

/// Matched copies must split together; covers same-peer periodic pairs.
fn mirror_marks_to_local_matches(a: &mut Adapt<'_>) -> i64 {
    let rank = a.mesh.rank();
    let marked: Vec<Entity> = a.mesh.iter(1).filter(|&e| a.get_flag(e, SPLIT)).collect();
    let mut changed = 0;
    for e in marked {
        for (peer, m) in a.mesh.matches_of(e).to_vec() {
            if peer == rank && !a.get_flag(m, SPLIT) {
                a.set_flag(m, SPLIT);
                a.clear_flag(m, DONT_SPLIT);
                changed += 1;
            }
        }
    }
    changed
}

/// Broadcasts every marked shared (and, with matching on, matched) edge to
/// its copies; returns how many local edges the incoming traffic newly
/// marked. Collective.
fn sync_marks(a: &mut Adapt<'_>) -> i64 {
    let peers = a.mesh.peers();
    if peers == 1 {
        return 0;
    }
    let rank = a.mesh.rank();
    let mut out = vec![Vec::<u64>::new(); peers];
    for e in a.mesh.iter(1) {
        if !a.get_flag(e, SPLIT) {
            continue;
        }
        for &(peer, handle) in a.mesh.remotes(e) {
            out[peer].push(handle.to_word());
        }
        if a.options.should_handle_matching {
            for &(peer, handle) in a.mesh.matches_of(e) {
                if peer != rank {
                    out[peer].push(handle.to_word());
                }
            }
        }
    }
    let incoming = a
        .mesh
        .comm()
        .exchange(out.iter().map(|w| pack_words(w)).collect());
    let mut changed = 0;
    for message in &incoming {
        for word in unpack_words(message) {
            let e = Entity::from_word(word);
            if !a.get_flag(e, SPLIT) {
                a.set_flag(e, SPLIT);
                a.clear_flag(e, DONT_SPLIT);
                changed += 1;
            }
        }
    }
    changed
}

/// Verifies that every shared entity of the given dimension carries the same
/// flag state on every peer holding a copy. Collective; the caller asserts
/// the result.
pub(crate) fn check_flag_consistency(a: &Adapt<'_>, dim: usize, flag: i32) -> bool {
    let peers = a.mesh.peers();
    if peers == 1 {
        return true;
    }
    let mut out = vec![Vec::<u64>::new(); peers];
    for e in a.mesh.iter(dim) {
        for &(peer, handle) in a.mesh.remotes(e) {
            out[peer].extend_from_slice(&[handle.to_word(), a.get_flag(e, flag) as u64]);
        }
    }
    let incoming = a
        .mesh
        .comm()
        .exchange(out.iter().map(|w| pack_words(w)).collect());
    let mut consistent = true;
    for message in &incoming {
        for pair in unpack_words(message).chunks_exact(2) {
            let e = Entity::from_word(pair[0]);
            consistent &= a.get_flag(e, flag) == (pair[1] != 0);
        }
    }
    !a.mesh.comm().or(!consistent)
}
