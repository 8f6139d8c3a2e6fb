//! HTTP protocol handling for the trainer's web interface.
//!
//! # Architecture
//!
//! - **`connection`**: drives one accepted socket from first byte to close
//! - **`framer`**: the request framing state machine
//! - **`parser`**: parses the request line and header block
//! - **`body`**: decodes urlencoded and multipart form bodies
//! - **`request`**: the decoded request and its parameter mapping
//! - **`response`**: status codes, response heads and error pages
//! - **`writer`**: streams response bytes to the client
//!
//! # Connection State Machine
//!
//! Each connection serves exactly one request:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Feed bytes to the framer
//!        └──────┬──────┘
//!               │
//!     ┌─────────┴──────────┐
//!     │ request framed     │ protocol error
//!     ▼                    ▼
//! ┌────────────┐     ┌────────────┐
//! │ Processing │     │ Rejecting  │ ← 400
//! └─────┬──────┘     └─────┬──────┘
//!       └────────┬─────────┘
//!                ▼
//!          ┌──────────┐
//!          │  Closed  │
//!          └──────────┘
//! ```
//!
//! Within `Reading`, the framer moves from `AwaitingHeaders` to
//! `AwaitingBody` (POST with a positive `Content-Length` only) to `Complete`.

pub mod body;
pub mod connection;
pub mod framer;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
