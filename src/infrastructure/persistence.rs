//! File persistence for control configurations.
//!
//! Controls serialize to plain JSON through [`Comp::to_json_value`] and
//! reconstruct through their `from_json_value` constructors, so a saved
//! file is just the configuration tree, readable by hand.

use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::application::Comp;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file format: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Saves and loads control configuration files.
pub struct ControlRepository;

impl ControlRepository {
    /// Writes a comp's configuration as pretty-printed JSON.
    pub fn save(comp: &impl Comp, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&comp.to_json_value())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads a configuration file back into its JSON form, ready for a
    /// comp constructor.
    pub fn load(path: impl AsRef<Path>) -> Result<JsonValue, PersistenceError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
