//! # Overview
//! `adze-refine` refines a distributed unstructured mesh by edge bisection:
//! a size-field oracle marks edges, marked splits propagate to every
//! incident face and region, and table-driven templates replace each
//! affected element with children built from the surviving and the new
//! mid-edge vertices. Solution fields, geometric classification, periodic
//! matches, and cross-peer connectivity all survive the sweep.
//!
//! One sweep is one call to [`Refine::refine`]; all peers call it together
//! and every collective step inside runs in lockstep.
//!
//! ## Example
//! Uniformly refining a one-triangle mesh:
//! ```
//! use adze_mesh::*;
//! use adze_refine::*;
//!
//! let mut mesh = Mesh::new(2);
//! let surface = ModelEntity::new(2, 0);
//! let v: Vec<_> = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]
//!     .iter()
//!     .map(|&[x, y]| mesh.create_vertex(surface, Point3::new(x, y, 0.0), Vector3::new(0.0, 0.0, 0.0)))
//!     .collect();
//! mesh.create_element(surface, EntityType::Tri, &v);
//!
//! let mut size = UniformSizeField;
//! let mut solution = NullTransfer;
//! let mut shape = NullShape;
//! let mut adapt = Adapt::new(&mut mesh, &mut size, &mut solution, &mut shape, AdaptOptions::default());
//! let mut refine = Refine::new(&mut adapt);
//! assert!(refine.refine(&mut adapt).unwrap());
//! refine.destroy(&mut adapt);
//! adapt.finish();
//!
//! // all three edges split: four child triangles
//! assert_eq!(mesh.count(2), 4);
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

mod adapt;
mod errors;
mod hooks;
mod link;
mod marking;
mod matching;
mod options;
mod refine;
mod size_field;
mod templates;
mod transfer;

pub use adapt::Adapt;
pub use errors::{Error, Result};
pub use hooks::{LayerHook, Snapper};
pub use options::AdaptOptions;
pub use refine::Refine;
pub use size_field::{SizeField, UniformSizeField};
pub use transfer::{LinearFieldTransfer, NullShape, NullTransfer, ShapeHandler, SolutionTransfer};
