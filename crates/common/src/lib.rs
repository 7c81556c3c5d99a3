//! Common utilities and shared types for yatube.
//!
//! This crate provides foundational components used across all yatube crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Cache stores**: Memory and Redis backends behind [`CacheStore`]
//! - **Storage**: File storage backends behind [`StorageBackend`]
//! - **Tokens**: Random tokens and suffixes via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use yatube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let token = IdGenerator::new().generate_token();
//!     println!("{} posts per page, token {}", config.feed.posts_per_page, token);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, UploadedFile, clean_file_name, save_unique};
