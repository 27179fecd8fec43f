//! Binary integer program for one planning horizon.
//!
//! One variable `x[w,t]` per week `w` and team `t` that has odds in `w` and
//! is not already used. Objective coefficient is `ln p[w,t]`, which turns the
//! joint survival product into a linear sum.
//!
//! Rows:
//! - week rows: `sum_t x[w,t] == 1`
//! - team rows: `sum_w x[w,t] <= 1`
//!
//! Used teams never get a variable, so no row is needed to exclude them.

use std::collections::BTreeMap;

use crate::config::MIN_WIN_PROBABILITY;
use crate::horizon::PlanningHorizon;
use crate::state::SelectionState;
use crate::types::{Team, WinProbability};

#[derive(Debug, Clone)]
pub struct Variable {
    /// Position of the week inside the horizon.
    pub week_index: usize,
    pub team: Team,
    pub coefficient: f64,
    pub odds: WinProbability,
}

#[derive(Debug, Clone, Default)]
pub struct SurvivorModel {
    pub weeks: Vec<u32>,
    pub variables: Vec<Variable>,
    /// Per week: variable indices whose sum must equal 1.
    pub week_rows: Vec<Vec<usize>>,
    /// Per team: variable indices whose sum must not exceed 1.
    pub team_rows: BTreeMap<Team, Vec<usize>>,
}

/// `ln p`, with `p` clamped into `[MIN_WIN_PROBABILITY, 1]`.
pub fn log_coefficient(probability: f64) -> f64 {
    let p = if probability.is_finite() {
        probability.clamp(MIN_WIN_PROBABILITY, 1.0)
    } else {
        MIN_WIN_PROBABILITY
    };
    p.ln()
}

impl SurvivorModel {
    pub fn build(horizon: &PlanningHorizon, state: &SelectionState) -> Self {
        let mut model = SurvivorModel {
            weeks: horizon.weeks.iter().map(|w| w.week).collect(),
            ..Default::default()
        };

        for (week_index, hw) in horizon.weeks.iter().enumerate() {
            let mut row = Vec::new();
            for (&team, odds) in &hw.probabilities {
                if !state.is_available(team) {
                    continue;
                }
                let idx = model.variables.len();
                model.variables.push(Variable {
                    week_index,
                    team,
                    coefficient: log_coefficient(odds.probability),
                    odds: *odds,
                });
                row.push(idx);
                model.team_rows.entry(team).or_default().push(idx);
            }
            model.week_rows.push(row);
        }

        model
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.week_rows.len() + self.team_rows.len()
    }

    /// Objective of a full assignment (one variable index per week).
    pub fn objective(&self, assignment: &[usize]) -> f64 {
        assignment.iter().map(|&v| self.variables[v].coefficient).sum()
    }

    /// True when `assignment` sets exactly one variable per week row and at
    /// most one per team row.
    #[cfg(test)]
    pub fn is_feasible(&self, assignment: &[usize]) -> bool {
        if assignment.len() != self.week_rows.len() {
            return false;
        }
        let week_ok = assignment
            .iter()
            .enumerate()
            .all(|(w, v)| self.week_rows[w].contains(v));
        let team_ok = self
            .team_rows
            .values()
            .all(|row| row.iter().filter(|v| assignment.contains(v)).count() <= 1);
        week_ok && team_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::tests::week_of;

    #[test]
    fn used_teams_get_no_variables() {
        let horizon = PlanningHorizon::new(vec![
            week_of(1, &[(Team::KC, 0.8), (Team::BUF, 0.7)]),
            week_of(2, &[(Team::KC, 0.6), (Team::BUF, 0.75), (Team::DAL, 0.55)]),
        ]);
        let state = SelectionState::from_used([Team::KC]).unwrap();

        let model = SurvivorModel::build(&horizon, &state);

        assert_eq!(model.variable_count(), 3);
        assert!(model.variables.iter().all(|v| v.team != Team::KC));
        assert_eq!(model.week_rows[0].len(), 1);
        assert_eq!(model.week_rows[1].len(), 2);
        // week rows + one row per available team (BUF, DAL)
        assert_eq!(model.constraint_count(), 4);
    }

    #[test]
    fn feasibility_checks_both_row_kinds() {
        let horizon = PlanningHorizon::new(vec![
            week_of(1, &[(Team::BUF, 0.7), (Team::DAL, 0.6)]),
            week_of(2, &[(Team::BUF, 0.75), (Team::DAL, 0.55)]),
        ]);
        let model = SurvivorModel::build(&horizon, &SelectionState::new());
        let var = |w: usize, t: Team| {
            model
                .variables
                .iter()
                .position(|v| v.week_index == w && v.team == t)
                .unwrap()
        };

        assert!(model.is_feasible(&[var(0, Team::BUF), var(1, Team::DAL)]));
        assert!(!model.is_feasible(&[var(0, Team::BUF), var(1, Team::BUF)]));
        assert!(!model.is_feasible(&[var(1, Team::DAL), var(0, Team::BUF)]));
        assert!(!model.is_feasible(&[var(0, Team::BUF)]));

        let obj = model.objective(&[var(0, Team::BUF), var(1, Team::DAL)]);
        assert!((obj - (0.7f64.ln() + 0.55f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn zero_probability_has_finite_coefficient() {
        let c = log_coefficient(0.0);
        assert!(c.is_finite());
        assert!(c < log_coefficient(0.01));
        assert_eq!(log_coefficient(1.0), 0.0);
        assert!(log_coefficient(f64::NAN).is_finite());
    }
}
