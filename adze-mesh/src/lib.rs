//! # Overview
//! `adze-mesh` is the mesh substrate under the `adze` refinement engine: an
//! in-memory distributed mesh of vertices, edges, faces, and regions with
//! ordered downward and unordered upward adjacency, per-entity tags,
//! geometric-model classification, and remote-copy bookkeeping for entities
//! shared between peers.
//!
//! ## Example
//! The following builds one triangle classified on model face 0 and walks
//! its adjacency.
//! ```
//! use adze_mesh::*;
//!
//! let mut mesh = Mesh::new(2);
//! let surface = ModelEntity::new(2, 0);
//! let v: Vec<_> = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]
//!     .iter()
//!     .map(|&[x, y]| mesh.create_vertex(surface, Point3::new(x, y, 0.0), Vector3::new(0.0, 0.0, 0.0)))
//!     .collect();
//! let tri = mesh.create_element(surface, EntityType::Tri, &v);
//!
//! // the boundary edges were created implicitly
//! assert_eq!(mesh.count(1), 3);
//! assert_eq!(mesh.boundary(tri).len(), 3);
//! let edge = mesh.find_upward(EntityType::Edge, &[v[0], v[1]]).unwrap();
//! assert_eq!(mesh.up(edge), &[tri]);
//! ```

#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

/// point in 3D space with `f64` scalars
pub type Point3 = cgmath::Point3<f64>;
/// vector in 3D space with `f64` scalars
pub type Vector3 = cgmath::Vector3<f64>;

mod entity;
mod mesh;
/// peer bus: collectives and the in-process multi-peer implementation
pub mod parallel;
mod tags;

pub use entity::{Entity, EntityType, ModelEntity};
pub use mesh::{BuildSink, IgnoreSink, Mesh};
pub use parallel::{Comm, LocalComm, SerialComm};
pub use tags::{DblTag, IntTag};
