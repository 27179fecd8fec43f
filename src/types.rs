use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// NFL franchise. Variants are declared in code order, so the derived `Ord`
/// is the lexicographic order of the team codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Team {
    ARI,
    ATL,
    BAL,
    BUF,
    CAR,
    CHI,
    CIN,
    CLE,
    DAL,
    DEN,
    DET,
    GB,
    HOU,
    IND,
    JAX,
    KC,
    LAC,
    LAR,
    LV,
    MIA,
    MIN,
    NE,
    NO,
    NYG,
    NYJ,
    PHI,
    PIT,
    SEA,
    SF,
    TB,
    TEN,
    WAS,
}

impl Team {
    pub const ALL: [Team; 32] = [
        Team::ARI, Team::ATL, Team::BAL, Team::BUF, Team::CAR, Team::CHI, Team::CIN, Team::CLE,
        Team::DAL, Team::DEN, Team::DET, Team::GB, Team::HOU, Team::IND, Team::JAX, Team::KC,
        Team::LAC, Team::LAR, Team::LV, Team::MIA, Team::MIN, Team::NE, Team::NO, Team::NYG,
        Team::NYJ, Team::PHI, Team::PIT, Team::SEA, Team::SF, Team::TB, Team::TEN, Team::WAS,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Team::ARI => "ARI",
            Team::ATL => "ATL",
            Team::BAL => "BAL",
            Team::BUF => "BUF",
            Team::CAR => "CAR",
            Team::CHI => "CHI",
            Team::CIN => "CIN",
            Team::CLE => "CLE",
            Team::DAL => "DAL",
            Team::DEN => "DEN",
            Team::DET => "DET",
            Team::GB => "GB",
            Team::HOU => "HOU",
            Team::IND => "IND",
            Team::JAX => "JAX",
            Team::KC => "KC",
            Team::LAC => "LAC",
            Team::LAR => "LAR",
            Team::LV => "LV",
            Team::MIA => "MIA",
            Team::MIN => "MIN",
            Team::NE => "NE",
            Team::NO => "NO",
            Team::NYG => "NYG",
            Team::NYJ => "NYJ",
            Team::PHI => "PHI",
            Team::PIT => "PIT",
            Team::SEA => "SEA",
            Team::SF => "SF",
            Team::TB => "TB",
            Team::TEN => "TEN",
            Team::WAS => "WAS",
        }
    }

    /// Franchise name as the odds provider reports it.
    pub fn full_name(self) -> &'static str {
        match self {
            Team::ARI => "Arizona Cardinals",
            Team::ATL => "Atlanta Falcons",
            Team::BAL => "Baltimore Ravens",
            Team::BUF => "Buffalo Bills",
            Team::CAR => "Carolina Panthers",
            Team::CHI => "Chicago Bears",
            Team::CIN => "Cincinnati Bengals",
            Team::CLE => "Cleveland Browns",
            Team::DAL => "Dallas Cowboys",
            Team::DEN => "Denver Broncos",
            Team::DET => "Detroit Lions",
            Team::GB => "Green Bay Packers",
            Team::HOU => "Houston Texans",
            Team::IND => "Indianapolis Colts",
            Team::JAX => "Jacksonville Jaguars",
            Team::KC => "Kansas City Chiefs",
            Team::LAC => "Los Angeles Chargers",
            Team::LAR => "Los Angeles Rams",
            Team::LV => "Las Vegas Raiders",
            Team::MIA => "Miami Dolphins",
            Team::MIN => "Minnesota Vikings",
            Team::NE => "New England Patriots",
            Team::NO => "New Orleans Saints",
            Team::NYG => "New York Giants",
            Team::NYJ => "New York Jets",
            Team::PHI => "Philadelphia Eagles",
            Team::PIT => "Pittsburgh Steelers",
            Team::SEA => "Seattle Seahawks",
            Team::SF => "San Francisco 49ers",
            Team::TB => "Tampa Bay Buccaneers",
            Team::TEN => "Tennessee Titans",
            Team::WAS => "Washington Commanders",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Team {
    type Err = AppError;

    /// Accepts a team code ("kc", "KC") or the full franchise name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let alias = match s.to_ascii_uppercase().as_str() {
            "WSH" => Some(Team::WAS),
            "JAC" => Some(Team::JAX),
            "LA" => Some(Team::LAR),
            _ => None,
        };
        if let Some(team) = alias {
            return Ok(team);
        }
        Team::ALL
            .iter()
            .copied()
            .find(|t| t.code().eq_ignore_ascii_case(s) || t.full_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::UnknownTeam(s.to_string()))
    }
}

impl TryFrom<String> for Team {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        team.code().to_string()
    }
}

// ---------------------------------------------------------------------------
// Games and probabilities
// ---------------------------------------------------------------------------

/// One matchup with American moneyline prices for both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub week: u32,
    pub home: Team,
    pub away: Team,
    pub home_moneyline: f64,
    pub away_moneyline: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Venue::Home => write!(f, "home"),
            Venue::Away => write!(f, "away"),
        }
    }
}

/// Vig-free chance that `team` wins its game in `week`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub week: u32,
    pub team: Team,
    pub opponent: Team,
    pub venue: Venue,
    pub probability: f64,
}

// ---------------------------------------------------------------------------
// Pick plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPick {
    pub week: u32,
    pub team: Team,
    pub opponent: Team,
    pub venue: Venue,
    pub win_probability: f64,
    pub opponent_probability: f64,
}

/// One optimizer run. The first entry is the actionable pick; the rest is
/// provisional look-ahead that gets recomputed next week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickPlan {
    pub picks: Vec<PlannedPick>,
    /// Sum of ln(win probability) over the picks.
    pub objective: f64,
}

impl PickPlan {
    pub fn current(&self) -> Option<&PlannedPick> {
        self.picks.first()
    }

    pub fn teams(&self) -> impl Iterator<Item = Team> + '_ {
        self.picks.iter().map(|p| p.team)
    }

    /// Joint probability of surviving every planned week.
    pub fn survival_probability(&self) -> f64 {
        self.picks.iter().map(|p| p.win_probability).product()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }
}
