//! The web interface: routing, page handlers and their HTML.

pub mod assets;
pub mod html;
pub mod pages;
pub mod router;

pub use router::{dispatch, Outcome, Page, Route};
