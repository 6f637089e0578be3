//! Report generators
//!
//! Three CSV reports share the same pipeline shape: one scope query, one
//! batched history load, metric computation in memory, then a terminal
//! CSV sink. They differ only in the sink.

pub mod csv;
pub mod status_time;
pub mod subepic_returns;
pub mod ttm_details;

pub use status_time::StatusTimeReport;
pub use subepic_returns::SubepicReturnsReport;
pub use ttm_details::TtmDetailsReport;
