mod config;
mod driver;
mod error;
mod fetcher;
mod horizon;
mod optimizer;
mod probability;
mod state;
mod types;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::driver::SeasonDriver;
use crate::error::Result;
use crate::fetcher::OddsApiClient;
use crate::state::{SelectionStore, SharedSelectionState};
use crate::types::{PickPlan, PlannedPick};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let state = SharedSelectionState::from_used(cfg.used_teams.iter().copied())?;
    info!(
        current_week = cfg.current_week,
        horizon = cfg.horizon_weeks,
        used = cfg.used_teams.len(),
        "Planning from week {} over {} weeks, {} teams already used",
        cfg.current_week,
        cfg.horizon_weeks,
        cfg.used_teams.len(),
    );

    let client = OddsApiClient::new(&cfg)?;
    let mut driver = SeasonDriver::new(client, state, cfg.horizon_weeks)
        .with_partial_plans(cfg.allow_partial_plan);

    let plan = driver.recommend(cfg.current_week).await?;
    log_plan(&plan);
    println!("{}", serde_json::to_string_pretty(&plan)?);

    match cfg.confirm_pick {
        Some(team) => {
            if plan.current().map(|p| p.team) != Some(team) {
                warn!(team = %team, "Confirmed pick differs from the recommendation");
            }
            driver.confirm(team)?;
            let used: Vec<String> = driver.state().snapshot().used().map(String::from).collect();
            info!("Supply USED_TEAMS={} on the next run", used.join(","));
        }
        None => info!("No CONFIRM_PICK given, selection state unchanged"),
    }

    Ok(())
}

fn log_plan(plan: &PickPlan) {
    for pick in &plan.picks {
        log_pick(pick);
    }
    info!(
        weeks = plan.len(),
        objective = plan.objective,
        "PLAN | weeks: {} | joint survival: {:.2}%",
        plan.len(),
        plan.survival_probability() * 100.0,
    );
}

fn log_pick(p: &PlannedPick) {
    info!(
        event = "PLANNED_PICK",
        week = p.week,
        team = %p.team,
        opponent = %p.opponent,
        venue = %p.venue,
        "WEEK {:>2} | {:<3} {} vs {:<3} | win: {:.4} | opp: {:.4}",
        p.week, p.team.code(), p.venue, p.opponent.code(), p.win_probability, p.opponent_probability,
    );
}
