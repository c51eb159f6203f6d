//! Engine configuration: which passes run inside each sweep.
//!
//! The member, field and local passes are the engine's reason to exist and
//! always run. The historical variants disagree on everything else, so the
//! remaining passes are independent toggles instead of hard-wired choices.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Sweep static module-visible members with a whole-source-set search.
    pub sweep_statics: bool,

    /// Before deleting a symbol, also delete construct-and-discard
    /// statements and private declarations that only exist to hold it.
    pub cascade_references: bool,

    /// Delete statements that follow an unconditional return in a block.
    pub delete_unreachable: bool,

    /// Replace single-implementation nested interfaces with their
    /// implementor and delete the interface.
    pub merge_single_impl_interfaces: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            sweep_statics: default_sweep_statics(),
            cascade_references: false,
            delete_unreachable: false,
            merge_single_impl_interfaces: false,
        }
    }
}

fn default_sweep_statics() -> bool {
    true
}

impl CleanConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file, e.g. `.deadsweep.toml` in a project root.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// All optional passes enabled; used by the aggressive cleanup mode.
    pub fn aggressive() -> Self {
        Self {
            sweep_statics: true,
            cascade_references: true,
            delete_unreachable: true,
            merge_single_impl_interfaces: true,
        }
    }
}
