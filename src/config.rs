use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::types::Team;

pub const ODDS_API_URL: &str = "https://api.the-odds-api.com/v4/sports/americanfootball_nfl/odds";
pub const DEFAULT_BOOKMAKER: &str = "draftkings";
pub const DEFAULT_REGIONS: &str = "us";
pub const DEFAULT_SEASON_START: &str = "2024-09-05";

/// Weeks in the NFL regular season. Horizons never extend past the last one.
pub const REGULAR_SEASON_WEEKS: u32 = 18;

/// Look-ahead used when HORIZON_WEEKS is not set.
pub const DEFAULT_HORIZON_WEEKS: u32 = 6;

/// Odds provider request timeout (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Delay before each retry of a failed weekly odds fetch, in milliseconds.
/// The fetch is attempted `len() + 1` times in total.
pub const FETCH_RETRY_BACKOFF_MS: &[u64] = &[500, 1000, 2000];

/// Floor applied before taking logs so a 0% side never yields ln(0).
pub const MIN_WIN_PROBABILITY: f64 = 1e-9;

/// Objectives closer than this are treated as tied.
pub const OBJECTIVE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct Config {
    /// Odds provider credential (ODDS_API_KEY)
    pub odds_api_key: String,
    pub odds_api_url: String,
    /// Bookmaker whose h2h market is read (ODDS_BOOKMAKER)
    pub bookmaker: String,
    pub regions: String,
    /// First day of week 1 (SEASON_START, YYYY-MM-DD)
    pub season_start: NaiveDate,
    /// First week of the planning horizon (CURRENT_WEEK)
    pub current_week: u32,
    /// Number of weeks planned jointly (HORIZON_WEEKS)
    pub horizon_weeks: u32,
    /// Teams picked in earlier weeks (USED_TEAMS, comma-separated codes or names)
    pub used_teams: Vec<Team>,
    /// Team actually picked this week, applied after the run (CONFIRM_PICK)
    pub confirm_pick: Option<Team>,
    /// Plan only the feasible leading weeks when a later week cannot be
    /// covered (ALLOW_PARTIAL_PLAN)
    pub allow_partial_plan: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let odds_api_key = std::env::var("ODDS_API_KEY").unwrap_or_default();
        if odds_api_key.trim().is_empty() {
            return Err(AppError::Config("ODDS_API_KEY must be set".to_string()));
        }

        let season_start = std::env::var("SEASON_START")
            .unwrap_or_else(|_| DEFAULT_SEASON_START.to_string());
        let season_start = NaiveDate::parse_from_str(season_start.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Config("SEASON_START must be a YYYY-MM-DD date".to_string()))?;

        let current_week = std::env::var("CURRENT_WEEK")
            .unwrap_or_else(|_| "1".to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::Config("CURRENT_WEEK must be a week number".to_string()))?;

        let horizon_weeks = std::env::var("HORIZON_WEEKS")
            .unwrap_or_else(|_| DEFAULT_HORIZON_WEEKS.to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::Config("HORIZON_WEEKS must be a positive integer".to_string()))?;

        let used_teams = parse_team_list(&std::env::var("USED_TEAMS").unwrap_or_default())?;

        let confirm_pick = match std::env::var("CONFIRM_PICK") {
            Ok(s) if !s.trim().is_empty() => Some(s.parse::<Team>()?),
            _ => None,
        };

        let cfg = Self {
            odds_api_key: odds_api_key.trim().to_string(),
            odds_api_url: std::env::var("ODDS_API_URL").unwrap_or_else(|_| ODDS_API_URL.to_string()),
            bookmaker: std::env::var("ODDS_BOOKMAKER")
                .unwrap_or_else(|_| DEFAULT_BOOKMAKER.to_string()),
            regions: std::env::var("ODDS_REGIONS").unwrap_or_else(|_| DEFAULT_REGIONS.to_string()),
            season_start,
            current_week,
            horizon_weeks,
            used_teams,
            confirm_pick,
            allow_partial_plan: std::env::var("ALLOW_PARTIAL_PLAN")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=REGULAR_SEASON_WEEKS).contains(&self.current_week) {
            return Err(AppError::Config(format!(
                "CURRENT_WEEK must be between 1 and {REGULAR_SEASON_WEEKS}, got {}",
                self.current_week
            )));
        }
        if self.horizon_weeks == 0 {
            return Err(AppError::Config("HORIZON_WEEKS must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Weeks planned in one run: `current ..= min(current + horizon - 1, 18)`.
pub fn horizon_weeks(current_week: u32, horizon_len: u32) -> Vec<u32> {
    if horizon_len == 0 || current_week == 0 || current_week > REGULAR_SEASON_WEEKS {
        return Vec::new();
    }
    let last = current_week
        .saturating_add(horizon_len - 1)
        .min(REGULAR_SEASON_WEEKS);
    (current_week..=last).collect()
}

/// Parse "KC, Buffalo Bills,phi" into teams. Empty entries are ignored.
pub fn parse_team_list(s: &str) -> Result<Vec<Team>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<Team>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_is_clamped_to_season_end() {
        assert_eq!(horizon_weeks(1, 4), vec![1, 2, 3, 4]);
        assert_eq!(horizon_weeks(16, 6), vec![16, 17, 18]);
        assert_eq!(horizon_weeks(18, 1), vec![18]);
        assert!(horizon_weeks(3, 0).is_empty());
        assert!(horizon_weeks(19, 2).is_empty());
    }

    #[test]
    fn team_list_accepts_codes_and_names() {
        let teams = parse_team_list("KC, Buffalo Bills,, phi ").unwrap();
        assert_eq!(teams, vec![Team::KC, Team::BUF, Team::PHI]);
        assert!(parse_team_list("").unwrap().is_empty());
        assert!(parse_team_list("KC,Springfield Atoms").is_err());
    }

    #[test]
    fn validate_rejects_out_of_season_week() {
        let mut cfg = Config {
            odds_api_key: "key".to_string(),
            odds_api_url: ODDS_API_URL.to_string(),
            bookmaker: DEFAULT_BOOKMAKER.to_string(),
            regions: DEFAULT_REGIONS.to_string(),
            season_start: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
            current_week: 19,
            horizon_weeks: DEFAULT_HORIZON_WEEKS,
            used_teams: Vec::new(),
            confirm_pick: None,
            allow_partial_plan: false,
            log_level: "info".to_string(),
        };
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
        cfg.current_week = 5;
        assert!(cfg.validate().is_ok());
        cfg.horizon_weeks = 0;
        assert!(cfg.validate().is_err());
    }
}
