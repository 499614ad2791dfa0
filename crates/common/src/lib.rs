//! Shared helpers used by every crate in the workspace: logging setup and
//! small wire types that are not owned by any single domain.

pub mod types;
pub mod utils;
