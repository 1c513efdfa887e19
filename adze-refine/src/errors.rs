use adze_mesh::EntityType;
use thiserror::Error;

/// Error handler for [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Contract violations surfaced by a refinement sweep.
///
/// Internal pipeline invariants (dense numbering, template closure, flag
/// agreement between peers) are not errors a caller can react to; those are
/// asserted and abort the job, because a half-split mesh cannot be rolled
/// back.
#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// The size field placed a split vertex outside the unit interval.
    #[error("size field placed a split at {0}, outside [0, 1]")]
    PlaceOutOfRange(f64),
    /// An element of a type with no split templates has a marked edge, so
    /// the mark cannot be completed to a supported pattern.
    #[error("no split templates for element type {0:?}")]
    UnsupportedElement(EntityType),
}
