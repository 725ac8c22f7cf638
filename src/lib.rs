//! PROPSHEET - Reactive Property Binding Library
//!
//! A headless component model for visual application builders: declarative
//! controls bind user-facing properties to a memoized dependency graph,
//! raw values may embed `{{expr}}` spans evaluated by a small sandboxed
//! expression language, and every mutation flows through an action-based
//! reducer protocol that produces new immutable instances.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
