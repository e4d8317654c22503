//! Permission evaluation for rendered UI affordances
//!
//! This module provides:
//! - AuthorizedMenu: the server-delivered menu tree for the current user
//! - PermissionStore: the set of allowed action codes, fail-open until loaded
//! - PermissionDirective: attach-time visibility decisions for render nodes

pub mod directive;
pub mod payload;
pub mod store;

pub use directive::{Attachment, PermissionDirective, RenderNode};
pub use payload::{AuthorizedMenu, MenuKind, MenuSource, StaticMenuSource};
pub use store::PermissionStore;
