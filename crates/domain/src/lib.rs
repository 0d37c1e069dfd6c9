//! # AdReach Domain
//!
//! Data types shared by every layer of the ads API client.
//!
//! This crate contains:
//! - The client error value ([`ApiError`]) and its [`ErrorKind`] taxonomy
//! - Cursor pagination types ([`PageResult`], [`PageCursor`], [`Cursor`])
//! - Platform error codes and endpoint defaults
//!
//! ## Architecture
//! - No dependencies on other AdReach crates
//! - No I/O

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

pub use errors::*;
pub use types::*;
