//! Shared async utilities for the cadence workspace.
//!
//! Provides the small cross-cutting pieces the sync pipeline leans on:
//! retry policies with exponential backoff, a process-global request gate
//! for outbound rate limiting, and environment-variable loading helpers.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod rate_limit;

pub use error::{Result, ToolingError};
