pub mod model;
pub mod solver;

pub use model::SurvivorModel;

use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::horizon::PlanningHorizon;
use crate::state::SelectionState;
use crate::types::{PickPlan, PlannedPick};

/// Chooses one unused team per horizon week, maximising the sum of
/// log win probabilities (the log of joint survival).
///
/// Pure with respect to its inputs: the selection state is only read.
pub struct SurvivorOptimizer;

impl SurvivorOptimizer {
    pub fn optimize(horizon: &PlanningHorizon, state: &SelectionState) -> Result<PickPlan> {
        let model = SurvivorModel::build(horizon, state);
        debug!(
            weeks = model.weeks.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            excluded = state.len(),
            "Survivor model built"
        );

        let solution = solver::solve(&model)?;
        info!(
            solves = solution.solves,
            objective = solution.objective,
            survival = solution.objective.exp(),
            "Survivor model solved"
        );

        let picks = solution
            .assignment
            .iter()
            .map(|&v| {
                let odds = &model.variables[v].odds;
                PlannedPick {
                    week: odds.week,
                    team: odds.team,
                    opponent: odds.opponent,
                    venue: odds.venue,
                    win_probability: odds.probability,
                    opponent_probability: 1.0 - odds.probability,
                }
            })
            .collect();

        Ok(PickPlan { picks, objective: solution.objective })
    }

    /// Like `optimize`, but when a later week is unsatisfiable, plans only the
    /// weeks before it. Fails if the first week itself cannot be covered.
    pub fn optimize_feasible_prefix(horizon: &PlanningHorizon, state: &SelectionState) -> Result<PickPlan> {
        match Self::optimize(horizon, state) {
            Err(AppError::InfeasiblePlan { week }) if horizon.first_week() != Some(week) => {
                let keep = horizon.weeks.iter().take_while(|w| w.week < week).count();
                warn!(
                    infeasible_week = week,
                    planned_weeks = keep,
                    "Horizon shrunk to the weeks before {week}"
                );
                let truncated = PlanningHorizon::new(horizon.weeks[..keep].to_vec());
                Self::optimize(&truncated, state)
            }
            other => other,
        }
    }
}
