//! OpsDeck Core Library
//!
//! This crate provides the shared pieces of the OpsDeck console shell:
//! - Error types with stable codes and suggestions
//! - Configuration (TOML file persistence)
//! - Permission evaluation (store, directive, authorized-menu payload)

pub mod config;
pub mod error;
pub mod permission;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::permission::{AuthorizedMenu, MenuKind, PermissionDirective, PermissionStore};
}

#[cfg(test)]
mod error_tests;
