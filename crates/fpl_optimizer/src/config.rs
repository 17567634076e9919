use crate::{
    constants::{
        BUDGET, DEFAULT_HORIZON, DEFAULT_TIME_LIMIT_SECS, MAX_PER_CLUB, MAX_TRANSFERS,
        SOLUTION_THRESHOLD, SQUAD_DEFENDERS, SQUAD_FORWARDS, SQUAD_GOALKEEPERS,
        SQUAD_MIDFIELDERS, SQUAD_SIZE, TEAM_MIN_DEFENDERS, TEAM_MIN_FORWARDS,
        TEAM_MIN_GOALKEEPERS, TEAM_MIN_MIDFIELDERS, TEAM_SIZE,
    },
    error::{FplOptError, Result},
    players::{GameWeek, Position},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::IntoEnumIterator;

/// メイン設定構造体
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
    pub rules: RulesConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub horizon: usize,         // number of gameweeks to plan
    pub first_gameweek: u32,    // label of the first planned gameweek
    pub time_limit_secs: f64,   // hard deadline handed to the engine
    pub solution_threshold: f64,
    pub verbose: bool,          // engine log to console
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            first_gameweek: 1,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            solution_threshold: SOLUTION_THRESHOLD,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// Gameweeks covered by the run, in planning order
    pub fn gameweeks(&self) -> Vec<GameWeek> {
        (0..self.horizon as u32)
            .map(|k| GameWeek(self.first_gameweek + k))
            .collect()
    }
}

/// Per-position head counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionCounts {
    #[serde(rename = "GK")]
    pub goalkeepers: usize,
    #[serde(rename = "DEF")]
    pub defenders: usize,
    #[serde(rename = "MID")]
    pub midfielders: usize,
    #[serde(rename = "FWD")]
    pub forwards: usize,
}

impl PositionCounts {
    pub fn get(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => self.goalkeepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    pub fn total(&self) -> usize {
        Position::iter().map(|p| self.get(p)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    pub squad_size: usize,
    pub budget: u32,
    pub max_per_club: usize,
    pub squad_quota: PositionCounts, // exact
    pub team_size: usize,
    pub team_minimum: PositionCounts, // lower bounds
    /// Swaps allowed per gameweek. One swap changes two squad memberships.
    pub max_transfers: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            squad_size: SQUAD_SIZE,
            budget: BUDGET,
            max_per_club: MAX_PER_CLUB,
            squad_quota: PositionCounts {
                goalkeepers: SQUAD_GOALKEEPERS,
                defenders: SQUAD_DEFENDERS,
                midfielders: SQUAD_MIDFIELDERS,
                forwards: SQUAD_FORWARDS,
            },
            team_size: TEAM_SIZE,
            team_minimum: PositionCounts {
                goalkeepers: TEAM_MIN_GOALKEEPERS,
                defenders: TEAM_MIN_DEFENDERS,
                midfielders: TEAM_MIN_MIDFIELDERS,
                forwards: TEAM_MIN_FORWARDS,
            },
            max_transfers: MAX_TRANSFERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the captain's points. 1.0 leaves captaincy unrewarded, 2.0 doubles it.
    pub captain_multiplier: f64,
    /// Penalty per unit of forecast variance for a starting player
    pub risk_aversion: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            captain_multiplier: 1.0,
            risk_aversion: 0.0,
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FplOptError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            FplOptError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<()> {
        self.validate_solver()?;
        self.validate_rules()?;
        self.validate_scoring()
    }

    fn validate_solver(&self) -> Result<()> {
        let solver = &self.solver;
        if solver.horizon == 0 {
            return Err(FplOptError::Config("horizon must be at least 1".to_string()));
        }
        if solver.first_gameweek == 0 {
            return Err(FplOptError::Config(
                "first_gameweek must be at least 1".to_string(),
            ));
        }
        let last = u32::try_from(solver.horizon)
            .ok()
            .and_then(|h| solver.first_gameweek.checked_add(h - 1));
        if last.is_none() {
            return Err(FplOptError::Config(format!(
                "horizon {} from gameweek {} runs past the last representable gameweek",
                solver.horizon, solver.first_gameweek
            )));
        }
        if !(solver.time_limit_secs.is_finite() && solver.time_limit_secs > 0.0) {
            return Err(FplOptError::Config(format!(
                "time_limit_secs must be positive, got {}",
                solver.time_limit_secs
            )));
        }
        if !(solver.solution_threshold > 0.0 && solver.solution_threshold < 1.0) {
            return Err(FplOptError::Config(format!(
                "solution_threshold must be in (0, 1), got {}",
                solver.solution_threshold
            )));
        }
        Ok(())
    }

    fn validate_rules(&self) -> Result<()> {
        let rules = &self.rules;
        if rules.squad_quota.total() != rules.squad_size {
            return Err(FplOptError::Config(format!(
                "squad_quota sums to {}, but squad_size is {}",
                rules.squad_quota.total(),
                rules.squad_size
            )));
        }
        if rules.team_size == 0 || rules.team_size > rules.squad_size {
            return Err(FplOptError::Config(format!(
                "team_size must be in 1..={}, got {}",
                rules.squad_size, rules.team_size
            )));
        }
        if rules.team_minimum.total() > rules.team_size {
            return Err(FplOptError::Config(format!(
                "team_minimum sums to {}, more than team_size {}",
                rules.team_minimum.total(),
                rules.team_size
            )));
        }
        for position in Position::iter() {
            if rules.team_minimum.get(position) > rules.squad_quota.get(position) {
                return Err(FplOptError::Config(format!(
                    "team_minimum for {} exceeds its squad_quota",
                    position
                )));
            }
        }
        if rules.max_per_club == 0 {
            return Err(FplOptError::Config(
                "max_per_club must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<()> {
        let scoring = &self.scoring;
        if !(scoring.captain_multiplier.is_finite() && scoring.captain_multiplier >= 1.0) {
            return Err(FplOptError::Config(format!(
                "captain_multiplier must be >= 1.0, got {}",
                scoring.captain_multiplier
            )));
        }
        if !(scoring.risk_aversion.is_finite() && scoring.risk_aversion >= 0.0) {
            return Err(FplOptError::Config(format!(
                "risk_aversion must be >= 0.0, got {}",
                scoring.risk_aversion
            )));
        }
        Ok(())
    }
}
