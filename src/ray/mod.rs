//! This module holds the [`Ray`] definition and the slab test used during traversal.
mod ray_impl;
mod slab;

pub use self::ray_impl::*;
pub use self::slab::*;
