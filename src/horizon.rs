use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::Result;
use crate::fetcher::OddsSource;
use crate::probability::game_probabilities;
use crate::types::{Team, WinProbability};

/// Teams with odds in one week. A team on bye or without a line is absent,
/// which is different from being present with a poor probability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizonWeek {
    pub week: u32,
    pub probabilities: BTreeMap<Team, WinProbability>,
}

impl HorizonWeek {
    pub fn new(week: u32) -> Self {
        Self { week, probabilities: BTreeMap::new() }
    }

    /// Keeps the first record for a team; returns false for a repeat.
    pub fn insert(&mut self, wp: WinProbability) -> bool {
        if self.get(wp.team).is_some() {
            return false;
        }
        self.probabilities.insert(wp.team, wp);
        true
    }

    pub fn get(&self, team: Team) -> Option<&WinProbability> {
        self.probabilities.get(&team)
    }
}

/// Consecutive weeks planned together. Rebuilt on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningHorizon {
    pub weeks: Vec<HorizonWeek>,
}

impl PlanningHorizon {
    pub fn new(weeks: Vec<HorizonWeek>) -> Self {
        Self { weeks }
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn first_week(&self) -> Option<u32> {
        self.weeks.first().map(|w| w.week)
    }
}

/// Fetches odds for each week of the horizon and converts them to
/// per-team win probabilities.
pub struct HorizonBuilder<'a, S> {
    source: &'a S,
}

impl<'a, S: OddsSource> HorizonBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Any week that fails to fetch aborts the whole horizon: a plan with a
    /// missing week cannot be scored.
    pub async fn build(&self, weeks: &[u32]) -> Result<PlanningHorizon> {
        let mut horizon = PlanningHorizon::default();

        for &week in weeks {
            let games = self.source.fetch_week(week).await?;
            let mut hw = HorizonWeek::new(week);
            for game in &games {
                let (home, away) = game_probabilities(game)?;
                for wp in [home, away] {
                    if !hw.insert(wp) {
                        warn!(week, team = %wp.team, "Team listed in more than one game, keeping first");
                    }
                }
            }
            if hw.probabilities.is_empty() {
                warn!(week, "No odds available for week {week}");
            }
            horizon.weeks.push(hw);
        }

        info!(
            weeks = horizon.len(),
            first_week = ?horizon.first_week(),
            "Planning horizon built: {}",
            horizon
                .weeks
                .iter()
                .map(|w| format!("wk{}={} teams", w.week, w.probabilities.len()))
                .collect::<Vec<_>>()
                .join(", "),
        );
        Ok(horizon)
    }
}
