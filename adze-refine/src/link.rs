//! Cross-peer identification of split vertices.
//!
//! A shared edge (or face) is split independently on every peer holding a
//! copy; the copies must then agree that their new mid vertices are one
//! distributed vertex. Each peer sends, for every shared split parent, the
//! pair (parent handle on the receiver, own split vertex handle); the
//! receiver resolves its own split vertex of that parent and registers the
//! sender's as a remote copy. Runs after `split_elements` (the vertices
//! exist) and before the transfers (which may read cross-peer adjacency).

use crate::adapt::Adapt;
use crate::refine::Refine;
use adze_mesh::parallel::{pack_words, unpack_words};
use adze_mesh::Entity;

pub(crate) fn link_new_verts(r: &Refine, a: &mut Adapt<'_>) {
    let peers = a.mesh.peers();
    if peers == 1 {
        return;
    }
    let mut out = vec![Vec::<u64>::new(); peers];
    for dim in 1..a.mesh.dim() {
        for (i, parent) in r.to_split(dim).iter().copied().enumerate() {
            if !a.mesh.is_shared(parent) {
                continue;
            }
            // a split tri face makes no interior vertex; nothing to link
            let Some(vert) = r.find_split_vert(a.mesh, dim, i) else {
                continue;
            };
            for &(peer, handle) in a.mesh.remotes(parent) {
                out[peer].extend_from_slice(&[handle.to_word(), vert.to_word()]);
            }
        }
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
                .expect("shared parent has no split vertex to link");
            a.mesh.add_remote(vert, from, Entity::from_word(pair[1]));
        }
    }
}
