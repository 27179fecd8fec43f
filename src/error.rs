use thiserror::Error;

use crate::types::Team;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid moneyline odds: {moneyline}")]
    InvalidOdds { moneyline: f64 },

    #[error("Odds fetch failed for week {week}: {reason}")]
    OddsFetch { week: u32, reason: String },

    #[error("Team already used: {0}")]
    AlreadyUsed(Team),

    #[error("No feasible pick plan: week {week} cannot be satisfied")]
    InfeasiblePlan { week: u32 },

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Only external data failures are worth another attempt. Re-running the
    /// optimizer on the same inputs reproduces the same error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::OddsFetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
