//! Reviewing queued unknown messages one calendar day at a time.

pub mod paginator;
pub mod workflow;

pub use paginator::{DayWindow, PaginateError, ReviewPage, ReviewPaginator};
pub use workflow::{apply_decisions, next_target, Bucket, Decision, Navigation, ReviewOutcome, ReviewSubmission};
