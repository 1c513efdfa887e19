use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Opaque handle to a mesh entity.
///
/// Packs the dimension and the arena slot index into one word, so handles are
/// `Copy`, hashable, and cheap to ship over the peer bus. A handle is only
/// meaningful on the peer that issued it; handles received from another peer
/// refer to entities of *that* peer's mesh.
/// ```
/// use adze_mesh::Entity;
/// let e = Entity::new(2, 7);
/// assert_eq!(e.dim(), 2);
/// assert_eq!(e, Entity::from_word(e.to_word()));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

const DIM_SHIFT: u64 = 48;

impl Entity {
    /// Creates a handle from a dimension and a slot index.
    #[inline(always)]
    pub fn new(dim: usize, index: usize) -> Self {
        Entity((dim as u64) << DIM_SHIFT | index as u64)
    }
    /// The entity dimension, 0 through 3.
    #[inline(always)]
    pub fn dim(self) -> usize { (self.0 >> DIM_SHIFT) as usize }
    /// The slot index within the dimension's arena.
    #[inline(always)]
    pub fn index(self) -> usize { (self.0 & ((1 << DIM_SHIFT) - 1)) as usize }
    /// The raw word, for packing into bus messages.
    #[inline(always)]
    pub fn to_word(self) -> u64 { self.0 }
    /// Rebuilds a handle from [`Entity::to_word`].
    #[inline(always)]
    pub fn from_word(word: u64) -> Self { Entity(word) }
}

impl Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}#{}", self.dim(), self.index())
    }
}

/// The topological species of a mesh entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum EntityType {
    /// dimension 0
    Vertex,
    /// dimension 1
    Edge,
    /// triangle face or 2D element
    Tri,
    /// quadrilateral face or 2D element
    Quad,
    /// tetrahedron
    Tet,
    /// hexahedron
    Hex,
    /// triangular prism (wedge)
    Prism,
    /// quadrilateral pyramid
    Pyramid,
}

use EntityType::*;

/// Canonical boundary orderings, one table per type.
///
/// The i-th boundary edge of an element spans the vertex index pair
/// `edge_verts()[i]`; masks, rotations, and split templates all index edges
/// through these tables, so the orderings are load-bearing and must not change.
impl EntityType {
    /// Dimension of entities of this type.
    #[inline(always)]
    pub const fn dim(self) -> usize {
        match self {
            Vertex => 0,
            Edge => 1,
            Tri | Quad => 2,
            Tet | Hex | Prism | Pyramid => 3,
        }
    }

    /// Number of downward vertices.
    #[inline(always)]
    pub const fn vertex_count(self) -> usize {
        match self {
            Vertex => 1,
            Edge => 2,
            Tri => 3,
            Quad | Tet => 4,
            Pyramid => 5,
            Prism => 6,
            Hex => 8,
        }
    }

    /// Number of boundary edges. An edge counts itself, so that every
    /// entity of dimension >= 1 has a well-defined edge-split bitmask.
    #[inline(always)]
    pub const fn edge_count(self) -> usize {
        match self {
            Vertex => 0,
            Edge => 1,
            Tri => 3,
            Quad => 4,
            Tet => 6,
            Pyramid => 8,
            Prism => 9,
            Hex => 12,
        }
    }

    /// Vertex index pairs of the boundary edges, in canonical order.
    pub fn edge_verts(self) -> &'static [[usize; 2]] {
        match self {
            Vertex => &[],
            Edge => &[[0, 1]],
            Tri => &[[0, 1], [1, 2], [2, 0]],
            Quad => &[[0, 1], [1, 2], [2, 3], [3, 0]],
            Tet => &[[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]],
            Pyramid => &[
                [0, 1], [1, 2], [2, 3], [3, 0],
                [0, 4], [1, 4], [2, 4], [3, 4],
            ],
            Prism => &[
                [0, 1], [1, 2], [2, 0],
                [0, 3], [1, 4], [2, 5],
                [3, 4], [4, 5], [5, 3],
            ],
            Hex => &[
                [0, 1], [1, 2], [2, 3], [3, 0],
                [0, 4], [1, 5], [2, 6], [3, 7],
                [4, 5], [5, 6], [6, 7], [7, 4],
            ],
        }
    }

    /// Types of the boundary faces of a 3D element, in canonical order.
    pub fn face_types(self) -> &'static [EntityType] {
        match self {
            Tet => &[Tri, Tri, Tri, Tri],
            Pyramid => &[Quad, Tri, Tri, Tri, Tri],
            Prism => &[Tri, Quad, Quad, Quad, Tri],
            Hex => &[Quad, Quad, Quad, Quad, Quad, Quad],
            _ => &[],
        }
    }

    /// Vertex index tuples of the boundary faces, matching `face_types()`.
    pub fn face_verts(self) -> &'static [&'static [usize]] {
        match self {
            Tet => &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]],
            Pyramid => &[
                &[0, 1, 2, 3],
                &[0, 1, 4],
                &[1, 2, 4],
                &[2, 3, 4],
                &[3, 0, 4],
            ],
            Prism => &[
                &[0, 1, 2],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[2, 0, 3, 5],
                &[3, 4, 5],
            ],
            Hex => &[
                &[0, 1, 2, 3],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
                &[4, 5, 6, 7],
            ],
            _ => &[],
        }
    }

    /// Canonical edge index for a vertex index pair, in either order.
    ///
    /// Panics if the pair does not span an edge of this type.
    pub fn edge_index(self, a: usize, b: usize) -> usize {
        self.edge_verts()
            .iter()
            .position(|&[p, q]| (p, q) == (a, b) || (p, q) == (b, a))
            .unwrap_or_else(|| panic!("{self:?} has no edge spanning vertices {a} and {b}"))
    }
}

/// Geometric model classification: the model entity (region, surface, curve,
/// or point of the underlying geometry) a mesh entity discretizes. Children
/// created by refinement inherit their parent's classification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ModelEntity {
    /// model entity dimension
    pub dim: u8,
    /// model entity id within its dimension
    pub id: u32,
}

impl ModelEntity {
    /// Shorthand constructor.
    #[inline(always)]
    pub const fn new(dim: u8, id: u32) -> Self { ModelEntity { dim, id } }
}
