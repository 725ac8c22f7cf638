//! Infrastructure layer providing external service integrations.
//!
//! This module contains implementations for external concerns like
//! file I/O and persistence of control configurations.

pub mod persistence;

pub use persistence::*;
