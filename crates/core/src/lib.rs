//! Core business logic for yatube.
//!
//! Access decisions, paginated feeds, the index fragment cache and the
//! write paths for posts, comments and follows.

pub mod services;

pub use services::*;
