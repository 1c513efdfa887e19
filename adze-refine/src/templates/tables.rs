//! Rotation and code-match tables.
//!
//! For each splittable type, `code_match` maps every edge-split bitmask to a
//! canonical template index plus the rigid rotation that carries the mask
//! onto the template's canonical pattern. The tables are generated once, at
//! first use, by rotating each mask through the type's rotation set; a mask
//! no rotation can canonicalize has no entry, and mark completion promotes
//! such elements to their full mask before any table lookup is dispatched.

use adze_mesh::EntityType;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// One resolved `code_match` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CodeEntry {
    /// canonical template index; 0 is the trivial empty mask, never dispatched
    pub template: usize,
    /// index into `rotations(etype)`
    pub rotation: usize,
}

/// Rigid rotations of each type, as vertex permutations: rotation `p` maps
/// the stored vertex tuple `v` to the canonical tuple `w`, `w[i] = v[p[i]]`.
pub(crate) fn rotations(etype: EntityType) -> &'static [&'static [usize]] {
    use EntityType::*;
    match etype {
        Edge => &[&[0, 1], &[1, 0]],
        Tri => &[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]],
        Quad => &[&[0, 1, 2, 3], &[1, 2, 3, 0], &[2, 3, 0, 1], &[3, 0, 1, 2]],
        // the twelve even permutations: rigid rotations of the tetrahedron
        Tet => &[
            &[0, 1, 2, 3],
            &[0, 2, 3, 1],
            &[0, 3, 1, 2],
            &[1, 0, 3, 2],
            &[1, 2, 0, 3],
            &[1, 3, 2, 0],
            &[2, 0, 1, 3],
            &[2, 1, 3, 0],
            &[2, 3, 0, 1],
            &[3, 0, 2, 1],
            &[3, 1, 0, 2],
            &[3, 2, 1, 0],
        ],
        _ => &[],
    }
}

/// Canonical `(mask, template index)` pairs per type. Template indices agree
/// with the per-type function tables in the sibling modules.
fn canonical_masks(etype: EntityType) -> &'static [(usize, usize)] {
    use EntityType::*;
    match etype {
        Edge => &[(0b1, 1)],
        Tri => &[(0b001, 1), (0b011, 2), (0b111, 3)],
        // bisection-only: an opposite pair, or all four around a centroid
        Quad => &[(0b0101, 1), (0b1111, 2)],
        // one edge; two adjacent; two opposite; three around a face; all six
        Tet => &[
            (0b000001, 1),
            (0b000011, 2),
            (0b100001, 3),
            (0b000111, 4),
            (0b111111, 5),
        ],
        _ => &[],
    }
}

/// Mask of the canonically rotated element: bit `j` of the result is the
/// split state of the edge spanning `(p[a], p[b])` where `(a, b)` is the
/// j-th canonical edge.
pub(crate) fn rotated_mask(etype: EntityType, mask: usize, p: &[usize]) -> usize {
    etype
        .edge_verts()
        .iter()
        .enumerate()
        .fold(0, |acc, (j, &[a, b])| {
            match mask >> etype.edge_index(p[a], p[b]) & 1 {
                1 => acc | 1 << j,
                _ => acc,
            }
        })
}

fn build_table(etype: EntityType) -> Vec<Option<CodeEntry>> {
    let canon: FxHashMap<usize, usize> = canonical_masks(etype).iter().copied().collect();
    (0..1usize << etype.edge_count())
        .map(|mask| {
            if mask == 0 {
                return Some(CodeEntry { template: 0, rotation: 0 });
            }
            rotations(etype).iter().enumerate().find_map(|(ri, &p)| {
                canon
                    .get(&rotated_mask(etype, mask, p))
                    .map(|&template| CodeEntry { template, rotation: ri })
            })
        })
        .collect()
}

static TABLES: LazyLock<[Vec<Option<CodeEntry>>; 8]> = LazyLock::new(|| {
    use EntityType::*;
    [Vertex, Edge, Tri, Quad, Tet, Hex, Prism, Pyramid].map(build_table)
});

/// The code-match table of a type, or `None` for types with no template set
/// (hexes, prisms, pyramids).
pub(crate) fn code_match(etype: EntityType) -> Option<&'static [Option<CodeEntry>]> {
    use EntityType::*;
    match etype {
        Edge | Tri | Quad | Tet => Some(&TABLES[etype as usize]),
        _ => None,
    }
}
