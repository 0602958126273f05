//! This module defines a [`Bvh`], how it is built and how it answers nearest hit queries.
//!
//! [`Bvh`]: struct.Bvh.html
//!

mod best_first;
mod build;
mod bvh_impl;
mod bvh_node;
mod iter;
mod queue;

pub use self::best_first::*;
pub use self::build::BuildOptions;
pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::iter::*;
pub use self::queue::*;
