use crate::verifier_errors::VerifierError;
use serde::Deserialize;

/// Configuration for one verification run.
///
/// Enabling or disabling a check family is an explicit per-run parameter,
/// never a process-wide flag, so independent runs stay reproducible and can
/// execute in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Aliasing and move discipline: conflicting borrows, use while
    /// borrowed, use after move.
    pub check_aliasing: bool,
    /// Borrow/owner lifetime containment.
    pub check_lifetimes: bool,
    /// Send/Sync gating of cross-thread transfer and share events.
    pub check_thread_safety: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            check_aliasing: true,
            check_lifetimes: true,
            check_thread_safety: true,
        }
    }
}

impl VerifierConfig {
    pub fn all_checks() -> Self {
        Self::default()
    }

    /// Parse a config from TOML. Missing keys fall back to their defaults,
    /// so an empty string is a valid full-checks config.
    pub fn from_toml(source: &str) -> Result<Self, VerifierError> {
        toml::from_str(source).map_err(|error| {
            VerifierError::malformed_config(format!("Could not parse verifier config: {}", error))
        })
    }
}
