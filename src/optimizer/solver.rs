//! Exact solver for a `SurvivorModel`.
//!
//! Week rows and team rows form a bipartite assignment problem (weeks to
//! teams, each week covered once, each team used at most once), so the
//! integer program is solved exactly by the Hungarian method on costs
//! `-coefficient`. A missing variable is a forbidden cell.
//!
//! Optima within `OBJECTIVE_EPSILON` of each other are resolved toward the
//! lexicographically smallest team sequence: week by week, the smallest team
//! that still admits an optimal completion is fixed.

use crate::config::OBJECTIVE_EPSILON;
use crate::error::{AppError, Result};
use crate::types::Team;

use super::model::SurvivorModel;

const TEAM_SLOTS: usize = Team::ALL.len();

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// One variable index per week.
    pub assignment: Vec<usize>,
    pub objective: f64,
    /// Assignment problems solved, including the tie-break pass.
    pub solves: u32,
}

/// Smallest week whose prefix of the horizon has no complete assignment.
///
/// Weeks are added one at a time to a bipartite week→team matching; the
/// first week that finds no augmenting path is the answer.
pub fn first_infeasible_week(model: &SurvivorModel) -> Option<u32> {
    let mut owner: [Option<usize>; TEAM_SLOTS] = [None; TEAM_SLOTS];
    for week_index in 0..model.week_rows.len() {
        let mut visited = [false; TEAM_SLOTS];
        if !augment(model, week_index, &mut visited, &mut owner) {
            return Some(model.weeks[week_index]);
        }
    }
    None
}

fn augment(
    model: &SurvivorModel,
    week_index: usize,
    visited: &mut [bool; TEAM_SLOTS],
    owner: &mut [Option<usize>; TEAM_SLOTS],
) -> bool {
    for &v in &model.week_rows[week_index] {
        let slot = model.variables[v].team as usize;
        if visited[slot] {
            continue;
        }
        visited[slot] = true;
        let free = match owner[slot] {
            None => true,
            Some(other) => augment(model, other, visited, owner),
        };
        if free {
            owner[slot] = Some(week_index);
            return true;
        }
    }
    false
}

pub fn solve(model: &SurvivorModel) -> Result<Solution> {
    if let Some(week) = first_infeasible_week(model) {
        return Err(AppError::InfeasiblePlan { week });
    }

    let table = CostTable::new(model);
    let no_plan = || AppError::InfeasiblePlan {
        week: model.weeks.first().copied().unwrap_or_default(),
    };

    let mut fixed: Vec<usize> = Vec::with_capacity(table.rows());
    let mut assignment = table.assign(&fixed).ok_or_else(no_plan)?;
    let optimum = model.objective(&assignment);
    let mut solves = 1;

    for week_index in 0..table.rows() {
        let chosen = model.variables[assignment[week_index]].team;
        for &v in &table.by_team[week_index] {
            let team = model.variables[v].team;
            if team >= chosen {
                break;
            }
            let slot = team as usize;
            if fixed.contains(&slot) {
                continue;
            }
            fixed.push(slot);
            solves += 1;
            let candidate = table.assign(&fixed);
            fixed.pop();
            if let Some(candidate) = candidate {
                if model.objective(&candidate) >= optimum - OBJECTIVE_EPSILON {
                    assignment = candidate;
                    break;
                }
            }
        }
        fixed.push(model.variables[assignment[week_index]].team as usize);
    }

    Ok(Solution { objective: model.objective(&assignment), assignment, solves })
}

/// Dense week × team-slot view of the model.
struct CostTable {
    /// `cost[w][slot]` is `-coefficient`, or infinity when no variable exists.
    cost: Vec<[f64; TEAM_SLOTS]>,
    var_at: Vec<[Option<usize>; TEAM_SLOTS]>,
    /// Week rows ordered by team code.
    by_team: Vec<Vec<usize>>,
}

impl CostTable {
    fn new(model: &SurvivorModel) -> Self {
        let rows = model.week_rows.len();
        let mut cost = vec![[f64::INFINITY; TEAM_SLOTS]; rows];
        let mut var_at = vec![[None; TEAM_SLOTS]; rows];
        let mut by_team = Vec::with_capacity(rows);

        for (w, row) in model.week_rows.iter().enumerate() {
            for &v in row {
                let slot = model.variables[v].team as usize;
                cost[w][slot] = -model.variables[v].coefficient;
                var_at[w][slot] = Some(v);
            }
            let mut ordered = row.clone();
            ordered.sort_by_key(|&v| model.variables[v].team);
            by_team.push(ordered);
        }

        Self { cost, var_at, by_team }
    }

    fn rows(&self) -> usize {
        self.cost.len()
    }

    /// Minimum-cost assignment with week `i` pinned to `fixed[i]` for every
    /// `i < fixed.len()`. Returns variable indices per week, or `None` when
    /// the pins leave some week uncoverable.
    fn assign(&self, fixed: &[usize]) -> Option<Vec<usize>> {
        let n = self.rows();
        let m = TEAM_SLOTS;
        if n == 0 {
            return Some(Vec::new());
        }
        if n > m {
            return None;
        }

        let cell = |w: usize, slot: usize| match fixed.get(w) {
            Some(&pin) if pin != slot => f64::INFINITY,
            _ => self.cost[w][slot],
        };

        // 1-based potentials; column 0 is the virtual start of each search.
        let mut u = vec![0.0f64; n + 1];
        let mut v = vec![0.0f64; m + 1];
        let mut owner = vec![0usize; m + 1];
        let mut way = vec![0usize; m + 1];

        for row in 1..=n {
            owner[0] = row;
            let mut col = 0;
            let mut min_slack = vec![f64::INFINITY; m + 1];
            let mut visited = vec![false; m + 1];

            loop {
                visited[col] = true;
                let r = owner[col];
                let mut delta = f64::INFINITY;
                let mut next = 0;
                for j in 1..=m {
                    if visited[j] {
                        continue;
                    }
                    let slack = cell(r - 1, j - 1) - u[r] - v[j];
                    if slack < min_slack[j] {
                        min_slack[j] = slack;
                        way[j] = col;
                    }
                    if min_slack[j] < delta {
                        delta = min_slack[j];
                        next = j;
                    }
                }
                if !delta.is_finite() {
                    return None;
                }
                for j in 0..=m {
                    if visited[j] {
                        u[owner[j]] += delta;
                        v[j] -= delta;
                    } else {
                        min_slack[j] -= delta;
                    }
                }
                col = next;
                if owner[col] == 0 {
                    break;
                }
            }

            while col != 0 {
                let prev = way[col];
                owner[col] = owner[prev];
                col = prev;
            }
        }

        let mut assignment = vec![0usize; n];
        for j in 1..=m {
            if owner[j] != 0 {
                assignment[owner[j] - 1] = self.var_at[owner[j] - 1][j - 1]?;
            }
        }
        Some(assignment)
    }
}
