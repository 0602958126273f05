//! Error types for building a [`Bvh`].
//!
//! [`Bvh`]: ../bvh/struct.Bvh.html

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while building a [`Bvh`].
///
/// The builder has no recoverable failure modes: an empty scene is reported as
/// `Ok(None)`, not as an error. Only running out of memory while growing its working
/// storage ends a build early.
///
/// [`Bvh`]: ../bvh/struct.Bvh.html
#[derive(Error, Debug)]
pub enum BuildError {
    /// Growing one of the builder's buffers failed.
    #[error("failed to allocate {requested} entries for {tag}")]
    Allocation {
        /// Names the buffer that could not grow.
        tag: &'static str,

        /// Number of entries the buffer was grown to.
        requested: usize,

        /// The allocator's error.
        #[source]
        source: TryReserveError,
    },
}

/// Result type for building operations.
pub type Result<T> = std::result::Result<T, BuildError>;
