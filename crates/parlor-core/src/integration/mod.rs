//! Integration layer - External system interfaces.
//!
//! This module contains the [`Puppet`] trait, the transport port that entity
//! handles call into for every remote operation.

pub mod puppet;

pub use puppet::{BoxedPuppet, Puppet};
