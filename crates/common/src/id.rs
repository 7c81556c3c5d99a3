//! Random token generation.

use uuid::Uuid;

/// Generator for API tokens and file name suffixes.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a random API token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // UUID v4 has no time component
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a short random suffix for de-duplicating file names.
    #[must_use]
    pub fn generate_suffix(&self) -> String {
        Uuid::new_v4().simple().to_string()[..7].to_string()
    }
}
