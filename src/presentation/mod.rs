//! Presentation layer describing property editors.
//!
//! Nothing here draws anything. The host maps [`editor::EditorView`]
//! descriptors onto its own widgets and dispatches the resulting actions
//! back into the application layer.

pub mod editor;

pub use editor::*;
