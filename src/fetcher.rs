use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Config, FETCH_RETRY_BACKOFF_MS, HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{Game, Team};

/// Source of weekly moneyline odds.
///
/// A week with no games is `Ok(vec![])`. Network, auth and parse failures
/// are `AppError::OddsFetch`.
#[allow(async_fn_in_trait)]
pub trait OddsSource {
    async fn fetch_week(&self, week: u32) -> Result<Vec<Game>>;
}

// ---------------------------------------------------------------------------
// The Odds API response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OddsApiEvent {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Bookmaker {
    pub key: String,
    pub markets: Vec<Market>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Market {
    pub key: String,
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Outcome {
    pub name: String,
    pub price: Option<f64>,
}

#[derive(Debug, Default)]
pub struct ParseStats {
    pub events: usize,
    pub games: usize,
    pub skipped_unknown_team: usize,
    pub skipped_missing_line: usize,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

enum Attempt {
    Done(Vec<Game>),
    Transient(String),
    Fatal(String),
}

pub struct OddsApiClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    bookmaker: String,
    regions: String,
    season_start: NaiveDate,
}

impl OddsApiClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: cfg.odds_api_key.clone(),
            url: cfg.odds_api_url.clone(),
            bookmaker: cfg.bookmaker.clone(),
            regions: cfg.regions.clone(),
            season_start: cfg.season_start,
        })
    }

    async fn fetch_once(&self, week: u32) -> Attempt {
        let (from, to) = week_window(self.season_start, week);
        let query = [
            ("apiKey", self.api_key.as_str()),
            ("regions", self.regions.as_str()),
            ("markets", "h2h"),
            ("oddsFormat", "american"),
            ("bookmakers", self.bookmaker.as_str()),
            ("commenceTimeFrom", from.as_str()),
            ("commenceTimeTo", to.as_str()),
        ];

        let response = match self.client.get(&self.url).query(&query).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Transient(format!("request failed: {e}")),
        };

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            debug!(week, remaining = remaining.to_str().unwrap_or("?"), "odds API quota");
        }

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return Attempt::Transient(format!("failed to read body: {e}")),
        };

        if !status.is_success() {
            let reason = format!("status {status}: {body}");
            return if status.is_server_error() || status.as_u16() == 429 {
                Attempt::Transient(reason)
            } else {
                Attempt::Fatal(reason)
            };
        }

        let events: Vec<OddsApiEvent> = match serde_json::from_str(&body) {
            Ok(e) => e,
            Err(e) => return Attempt::Fatal(format!("unexpected response shape: {e}")),
        };

        let (games, stats) = parse_events(week, &events, &self.bookmaker);
        info!(
            week,
            events = stats.events,
            games = stats.games,
            skipped_unknown_team = stats.skipped_unknown_team,
            skipped_missing_line = stats.skipped_missing_line,
            "Fetched week {week}: {} games from {} events",
            stats.games,
            stats.events,
        );
        Attempt::Done(games)
    }
}

impl OddsSource for OddsApiClient {
    async fn fetch_week(&self, week: u32) -> Result<Vec<Game>> {
        let mut retries = FETCH_RETRY_BACKOFF_MS.iter();
        loop {
            let reason = match self.fetch_once(week).await {
                Attempt::Done(games) => return Ok(games),
                Attempt::Fatal(reason) => return Err(AppError::OddsFetch { week, reason }),
                Attempt::Transient(reason) => reason,
            };
            match retries.next() {
                Some(&delay_ms) => {
                    warn!(week, delay_ms, "Odds fetch failed, retrying: {reason}");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                None => return Err(AppError::OddsFetch { week, reason }),
            }
        }
    }
}

/// `[start, end)` of a week as RFC 3339 UTC strings. Week 1 begins at
/// `season_start` midnight.
pub fn week_window(season_start: NaiveDate, week: u32) -> (String, String) {
    let offset = TimeDelta::weeks(i64::from(week.saturating_sub(1)));
    let start: NaiveDateTime = (season_start + offset).and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = start + TimeDelta::days(7);
    let fmt = "%Y-%m-%dT%H:%M:%SZ";
    (start.format(fmt).to_string(), end.format(fmt).to_string())
}

/// Turn provider events into games using one bookmaker's h2h market.
/// Events without both prices or with unrecognised teams are skipped.
pub fn parse_events(week: u32, events: &[OddsApiEvent], bookmaker: &str) -> (Vec<Game>, ParseStats) {
    let mut stats = ParseStats { events: events.len(), ..Default::default() };
    let mut games = Vec::new();

    for event in events {
        let (home, away) = match (event.home_team.parse::<Team>(), event.away_team.parse::<Team>()) {
            (Ok(h), Ok(a)) => (h, a),
            _ => {
                warn!(
                    week,
                    event_id = %event.id,
                    "Skipping event with unrecognised teams: {} vs {}",
                    event.home_team,
                    event.away_team,
                );
                stats.skipped_unknown_team += 1;
                continue;
            }
        };

        let outcomes = event
            .bookmakers
            .iter()
            .filter(|b| b.key == bookmaker)
            .flat_map(|b| b.markets.iter())
            .filter(|m| m.key == "h2h")
            .flat_map(|m| m.outcomes.iter());

        let mut home_line = None;
        let mut away_line = None;
        for outcome in outcomes {
            if outcome.name == event.home_team {
                home_line = outcome.price;
            } else if outcome.name == event.away_team {
                away_line = outcome.price;
            }
        }

        let (Some(home_moneyline), Some(away_moneyline)) = (home_line, away_line) else {
            debug!(week, event_id = %event.id, "No {bookmaker} h2h line for {away} @ {home}");
            stats.skipped_missing_line += 1;
            continue;
        };

        games.push(Game { week, home, away, home_moneyline, away_moneyline });
    }

    stats.games = games.len();
    (games, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {
            "id": "e1",
            "commence_time": "2024-09-06T00:20:00Z",
            "home_team": "Kansas City Chiefs",
            "away_team": "Baltimore Ravens",
            "bookmakers": [
                {
                    "key": "draftkings",
                    "markets": [
                        {
                            "key": "h2h",
                            "outcomes": [
                                {"name": "Baltimore Ravens", "price": 130},
                                {"name": "Kansas City Chiefs", "price": -150}
                            ]
                        }
                    ]
                }
            ]
        },
        {
            "id": "e2",
            "home_team": "Philadelphia Eagles",
            "away_team": "Green Bay Packers",
            "bookmakers": [
                {"key": "fanduel", "markets": [{"key": "h2h", "outcomes": [
                    {"name": "Philadelphia Eagles", "price": -120},
                    {"name": "Green Bay Packers", "price": 100}
                ]}]}
            ]
        },
        {
            "id": "e3",
            "home_team": "London Monarchs",
            "away_team": "Buffalo Bills",
            "bookmakers": []
        }
    ]"#;

    #[test]
    fn parses_h2h_lines_for_configured_bookmaker() {
        let events: Vec<OddsApiEvent> = serde_json::from_str(FIXTURE).unwrap();
        let (games, stats) = parse_events(1, &events, "draftkings");

        assert_eq!(games.len(), 1);
        let g = &games[0];
        assert_eq!((g.home, g.away), (Team::KC, Team::BAL));
        assert_eq!(g.home_moneyline, -150.0);
        assert_eq!(g.away_moneyline, 130.0);
        assert_eq!(stats.events, 3);
        assert_eq!(stats.skipped_missing_line, 1);
        assert_eq!(stats.skipped_unknown_team, 1);
    }

    #[test]
    fn other_bookmaker_is_used_when_configured() {
        let events: Vec<OddsApiEvent> = serde_json::from_str(FIXTURE).unwrap();
        let (games, _) = parse_events(1, &events, "fanduel");
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home, Team::PHI);
    }

    #[test]
    fn empty_week_is_not_an_error() {
        let (games, stats) = parse_events(4, &[], "draftkings");
        assert!(games.is_empty());
        assert_eq!(stats.events, 0);
    }

    #[test]
    fn week_window_steps_by_seven_days() {
        let start = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();
        assert_eq!(
            week_window(start, 1),
            ("2024-09-05T00:00:00Z".to_string(), "2024-09-12T00:00:00Z".to_string())
        );
        assert_eq!(week_window(start, 3).0, "2024-09-19T00:00:00Z");
    }
}
