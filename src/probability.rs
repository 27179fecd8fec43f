use crate::error::{AppError, Result};
use crate::types::{Game, Venue, WinProbability};

/// Raw implied probability of one American moneyline price.
///
/// `+m` → 100 / (m + 100), `-m` → |m| / (|m| + 100). Prices strictly between
/// -100 and +100, zero, and non-finite values are not valid moneylines.
pub fn implied_probability(moneyline: f64) -> Result<f64> {
    if !moneyline.is_finite() || moneyline.abs() < 100.0 {
        return Err(AppError::InvalidOdds { moneyline });
    }
    let p = if moneyline > 0.0 {
        100.0 / (moneyline + 100.0)
    } else {
        let m = moneyline.abs();
        m / (m + 100.0)
    };
    Ok(p)
}

/// Vig-free probabilities for both sides of one market. The pair sums to 1.
pub fn normalized_pair(moneyline_a: f64, moneyline_b: f64) -> Result<(f64, f64)> {
    let a = implied_probability(moneyline_a)?;
    let b = implied_probability(moneyline_b)?;
    let total = a + b;
    let pa = a / total;
    Ok((pa, 1.0 - pa))
}

/// Both sides of a game as `(home, away)` win probabilities.
pub fn game_probabilities(game: &Game) -> Result<(WinProbability, WinProbability)> {
    let (home_p, away_p) = normalized_pair(game.home_moneyline, game.away_moneyline)?;
    let home = WinProbability {
        week: game.week,
        team: game.home,
        opponent: game.away,
        venue: Venue::Home,
        probability: home_p,
    };
    let away = WinProbability {
        week: game.week,
        team: game.away,
        opponent: game.home,
        venue: Venue::Away,
        probability: away_p,
    };
    Ok((home, away))
}
