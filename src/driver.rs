use tracing::info;

use crate::config::horizon_weeks;
use crate::error::{AppError, Result};
use crate::fetcher::OddsSource;
use crate::horizon::HorizonBuilder;
use crate::optimizer::SurvivorOptimizer;
use crate::state::{SelectionState, SelectionStore};
use crate::types::{PickPlan, Team};

/// Runs one reoptimization per week and carries the selection state forward.
///
/// `recommend` never changes the state. The pick actually made, which may
/// differ from the recommendation, is recorded with `confirm` before the next
/// week's run. With an `Arc<SharedSelectionState>` store, several drivers can
/// confirm into one season and a team still goes to at most one of them.
pub struct SeasonDriver<S, T = SelectionState> {
    source: S,
    state: T,
    horizon_len: u32,
    allow_partial_plan: bool,
}

impl<S: OddsSource, T: SelectionStore> SeasonDriver<S, T> {
    pub fn new(source: S, state: T, horizon_len: u32) -> Self {
        Self { source, state, horizon_len, allow_partial_plan: false }
    }

    pub fn with_partial_plans(mut self, allow: bool) -> Self {
        self.allow_partial_plan = allow;
        self
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    /// Plan `current_week ..` and return the plan; its first entry is this
    /// week's recommendation.
    pub async fn recommend(&self, current_week: u32) -> Result<PickPlan> {
        let weeks = horizon_weeks(current_week, self.horizon_len);
        if weeks.is_empty() {
            return Err(AppError::Config(format!(
                "no weeks to plan from week {current_week} with horizon {}",
                self.horizon_len
            )));
        }

        let horizon = HorizonBuilder::new(&self.source).build(&weeks).await?;
        let state = self.state.snapshot();
        let plan = if self.allow_partial_plan {
            SurvivorOptimizer::optimize_feasible_prefix(&horizon, &state)?
        } else {
            SurvivorOptimizer::optimize(&horizon, &state)?
        };

        if let Some(pick) = plan.current() {
            info!(
                week = pick.week,
                team = %pick.team,
                opponent = %pick.opponent,
                win_probability = pick.win_probability,
                "Recommended pick for week {}: {} ({} vs {}, {:.1}%)",
                pick.week,
                pick.team,
                pick.venue,
                pick.opponent,
                pick.win_probability * 100.0,
            );
        }
        Ok(plan)
    }

    /// Record the team actually picked this week.
    pub fn confirm(&mut self, team: Team) -> Result<()> {
        self.state.record(team)?;
        info!(team = %team, used = self.state.snapshot().len(), "Pick confirmed: {team}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::horizon::tests::FakeOddsSource;
    use crate::state::SharedSelectionState;

    fn season() -> FakeOddsSource {
        FakeOddsSource::default()
            .with_game(1, Team::KC, Team::BAL, -400.0, 320.0)
            .with_game(1, Team::BUF, Team::ARI, -250.0, 205.0)
            .with_game(2, Team::KC, Team::CIN, -700.0, 500.0)
            .with_game(2, Team::BUF, Team::MIA, -180.0, 155.0)
            .with_game(3, Team::BUF, Team::JAX, -320.0, 260.0)
            .with_game(3, Team::KC, Team::ATL, -150.0, 130.0)
    }

    #[tokio::test]
    async fn recommendation_looks_ahead() {
        let driver = SeasonDriver::new(season(), SelectionState::new(), 2);
        let plan = driver.recommend(1).await.unwrap();

        // KC is worth more in week 2 than in week 1.
        let teams: Vec<_> = plan.teams().collect();
        assert_eq!(teams, vec![Team::BUF, Team::KC]);
        assert_eq!(*driver.source.calls.borrow(), vec![1, 2]);
        assert_eq!(driver.state().len(), 0, "recommend must not consume teams");
    }

    #[tokio::test]
    async fn confirmed_override_feeds_next_week() {
        let mut driver = SeasonDriver::new(season(), SelectionState::new(), 2);
        let plan = driver.recommend(1).await.unwrap();
        assert_eq!(plan.current().map(|p| p.team), Some(Team::BUF));

        // User went with KC anyway.
        driver.confirm(Team::KC).unwrap();
        let next = driver.recommend(2).await.unwrap();
        assert!(next.teams().all(|t| t != Team::KC));
        assert_eq!(next.current().map(|p| p.week), Some(2));

        let err = driver.confirm(Team::KC).unwrap_err();
        assert!(matches!(err, AppError::AlreadyUsed(Team::KC)));
    }

    #[tokio::test]
    async fn fetch_failure_produces_no_plan() {
        let source = FakeOddsSource { failing: vec![2], ..season() };
        let driver = SeasonDriver::new(source, SelectionState::new(), 3);
        let err = driver.recommend(1).await.unwrap_err();
        assert!(matches!(err, AppError::OddsFetch { week: 2, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn partial_plan_covers_leading_weeks() {
        // Every week-3 team is spent.
        let state = SelectionState::from_used([Team::BUF, Team::JAX, Team::KC, Team::ATL]).unwrap();
        let strict = SeasonDriver::new(season(), state.clone(), 3);
        let err = strict.recommend(1).await.unwrap_err();
        assert!(matches!(err, AppError::InfeasiblePlan { week: 3 }), "{err}");

        let lenient = SeasonDriver::new(season(), state, 3).with_partial_plans(true);
        let plan = lenient.recommend(1).await.unwrap();
        assert_eq!(plan.picks.iter().map(|p| p.week).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(plan.teams().collect::<Vec<_>>(), vec![Team::ARI, Team::MIA]);
    }

    #[tokio::test]
    async fn horizon_past_season_end_is_rejected() {
        let driver = SeasonDriver::new(season(), SelectionState::new(), 2);
        assert!(matches!(driver.recommend(19).await, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn drivers_sharing_a_store_never_double_spend() {
        let store = SharedSelectionState::from_used([Team::ARI]).unwrap();
        let mut mine = SeasonDriver::new(season(), Arc::clone(&store), 2);
        let mut theirs = SeasonDriver::new(season(), Arc::clone(&store), 2);

        let plan = mine.recommend(1).await.unwrap();
        assert!(plan.teams().all(|t| t != Team::ARI));
        assert_eq!(plan.current().map(|p| p.team), Some(Team::BUF));
        mine.confirm(Team::BUF).unwrap();

        // The other driver sees BUF spent without being told.
        let next = theirs.recommend(2).await.unwrap();
        assert!(next.teams().all(|t| t != Team::BUF && t != Team::ARI));
        let err = theirs.confirm(Team::BUF).unwrap_err();
        assert!(matches!(err, AppError::AlreadyUsed(Team::BUF)));

        let used: Vec<_> = store.snapshot().used().collect();
        assert_eq!(used, vec![Team::ARI, Team::BUF]);
    }
}
