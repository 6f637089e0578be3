//! Remote tracker API integration
//!
//! Typed client for the tracker's REST surface: scroll-paginated search,
//! issue fetch (single and batched), and the paged changelog. All
//! outbound traffic goes through the shared request gate and the retry
//! policy.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ScrollSearch, TrackerClient};
pub use error::TrackerError;
pub use types::{ChangelogEntry, FieldChange, IssueDto, IssueRef, LinkDto, TaskId};
