//! Configuration types for the engine.
//!
//! This module provides configuration options for:
//! - [`EngineConfig`]: Engine-wide settings
//! - [`PaginationConfig`]: Collection page sizes
//! - [`IdStrategy`]: Id assignment for created resources

mod engine;
mod pagination;

pub use engine::{EngineConfig, IdStrategy};
pub use pagination::PaginationConfig;
