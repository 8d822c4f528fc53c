//! CLI command implementations

pub mod batch;
pub mod format;
pub mod profiles;
pub mod recommend;
