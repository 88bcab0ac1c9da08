//! Tunables shared by the domain services.

use std::str::FromStr;
use std::time::Duration;

/// Upper bounds on calls leaving the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on every journal read or append.
    pub journal: Duration,
    /// Bound on every catalog lookup.
    pub catalog: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            journal: Duration::from_millis(5000),
            catalog: Duration::from_millis(2000),
        }
    }
}

/// What a cart read does with entries whose product no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleEntryPolicy {
    /// Hide the entry from the read but keep it in the cart.
    #[default]
    Retain,
    /// Remove the entry from the cart as part of the read.
    Purge,
}

impl FromStr for StaleEntryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "retain" => Ok(StaleEntryPolicy::Retain),
            "purge" => Ok(StaleEntryPolicy::Purge),
            other => Err(format!("unknown stale entry policy: {other}")),
        }
    }
}
