//! Certificate FSM State Definitions
//!
//! Stored as lowercase TEXT; an unset column reads as `Pending`.
//! `Minted` is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// Certificate lifecycle states
///
/// ```text
/// pending -> processing -> minted        (terminal)
///                       -> failed -> pending (retry, clears error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CertStatus {
    Pending,
    Processing,
    Minted,
    Failed,
}

impl CertStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, CertStatus::Minted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertStatus::Pending => "pending",
            CertStatus::Processing => "processing",
            CertStatus::Minted => "minted",
            CertStatus::Failed => "failed",
        }
    }

    /// Parse an externally supplied status string
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(CertStatus::Pending),
            "processing" => Ok(CertStatus::Processing),
            "minted" => Ok(CertStatus::Minted),
            "failed" => Ok(CertStatus::Failed),
            other => Err(CoreError::UnknownCertStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
