//! Workspace management for a single run.
//!
//! A run owns three directories under the workspace root:
//!
//! - `archives/`: downloaded product archives, each deleted as soon as it
//!   has been extracted
//! - `extracted/`: raw products, one subdirectory per product
//! - `frames/`: rendered frames
//!
//! plus the animation file written next to them. `prepare` purges all of it
//! before a run starts and `release` removes it again when the run ends,
//! whatever the outcome.

mod error;
mod fs;
mod manager;

pub use error::WorkspaceError;
pub use fs::{LocalFs, WorkspaceFs};
pub use manager::{Workspace, WorkspaceConfig, WorkspaceManager};

pub(crate) use manager::sanitize_component;
