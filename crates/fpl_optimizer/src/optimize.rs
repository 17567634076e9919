pub mod constraints;
pub mod objective;
pub mod plan;
pub mod solver;
pub mod transfers;
pub mod variables;

pub use constraints::{ConstraintFamily, ConstraintSet};
pub use plan::{GameWeekSelection, SquadPlan};
pub use solver::{BackendOutcome, HighsBackend, Problem, SolveOptions, SolveStatus, SolverBackend};
pub use variables::{SelectionStatus, SelectionVars};

use crate::config::Config;
use crate::error::{FplOptError, Result};
use crate::players::{CurrentSquad, PlayerPool};
use crate::predictions::Predictions;
use good_lp::{Expression, ProblemVariables};
use serde::Serialize;
use std::time::Instant;
use strum::IntoEnumIterator;

/// Result of one optimisation run. `plan` is present only for OPTIMAL/FEASIBLE.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub backend: String,
    pub solve_time_ms: u64,
    pub message: Option<String>,
    pub plan: Option<SquadPlan>,
}

/// Builds the squad selection model eagerly from validated inputs
pub struct SquadModelBuilder<'a> {
    pool: &'a PlayerPool,
    predictions: &'a Predictions,
    config: &'a Config,
    current: Option<&'a CurrentSquad>,
}

impl<'a> SquadModelBuilder<'a> {
    pub fn new(pool: &'a PlayerPool, predictions: &'a Predictions, config: &'a Config) -> Self {
        Self {
            pool,
            predictions,
            config,
            current: None,
        }
    }

    /// Incumbent squad held before the first planned gameweek
    pub fn current_squad(mut self, current: &'a CurrentSquad) -> Self {
        self.current = Some(current);
        self
    }

    pub fn build(self) -> Result<SquadModel<'a>> {
        log::info!("=== start squad model construction ===");
        if self.config.solver.horizon == 0 {
            return Err(FplOptError::invalid_input("horizon must be at least 1"));
        }
        self.config.validate()?;
        self.validate_inputs()?;

        let gameweeks = self.config.solver.gameweeks();
        log::info!(
            "players: {}, gameweeks: {}..={}",
            self.pool.len(),
            gameweeks[0],
            gameweeks[gameweeks.len() - 1]
        );

        // 1. 決定変数の定義
        let mut variables = ProblemVariables::new();
        let selection = SelectionVars::allocate(&mut variables, self.pool, &gameweeks);

        // 2. 制約条件の追加
        let mut constraints = ConstraintSet::new();
        constraints::add_gameweek_constraints(
            &mut constraints,
            &selection,
            self.pool,
            &self.config.rules,
        );

        // 3. 移籍制約
        let transfer_indicators = transfers::link_transfers(
            &mut variables,
            &mut constraints,
            &selection,
            self.pool,
            self.current,
            self.config.rules.max_transfers,
        );

        // 4. 目的関数の構築
        let objective = objective::assemble_objective(
            &selection,
            self.pool,
            self.predictions,
            &self.config.scoring,
        );

        log::info!(
            "number of variables: {} (selection {}, transfer indicators {})",
            selection.len() + transfer_indicators,
            selection.len(),
            transfer_indicators
        );
        constraints.log_summary();

        Ok(SquadModel {
            pool: self.pool,
            predictions: self.predictions,
            config: self.config,
            current: self.current,
            variables,
            selection,
            constraints,
            objective,
            transfer_indicators,
        })
    }

    /// Preconditions checked before any solve attempt
    fn validate_inputs(&self) -> Result<()> {
        let rules = &self.config.rules;

        for position in crate::players::Position::iter() {
            let available = self.pool.count_by_position(position);
            let required = rules.squad_quota.get(position);
            if available < required {
                return Err(FplOptError::invalid_input(format!(
                    "{} {} player(s) available, squad quota needs {}",
                    available, position, required
                )));
            }
        }

        if let Some(current) = self.current
            && current.len() != rules.squad_size
        {
            return Err(FplOptError::invalid_input(format!(
                "current squad has {} players, expected {}",
                current.len(),
                rules.squad_size
            )));
        }

        let planned = self.config.solver.gameweeks();
        for gw in self.predictions.gameweeks() {
            if !planned.contains(&gw) {
                log::debug!("forecasts for {} are outside the planning window", gw);
                continue;
            }
            for name in self.predictions.names_in(gw) {
                if !self.pool.contains(name) {
                    return Err(FplOptError::invalid_input(format!(
                        "{}: forecast for unknown player '{}'",
                        gw, name
                    )));
                }
                if !self.predictions.get(gw, name).expected_points.is_finite() {
                    return Err(FplOptError::invalid_input(format!(
                        "{}: non-finite forecast for '{}'",
                        gw, name
                    )));
                }
            }
        }

        let missing = planned
            .iter()
            .filter(|gw| self.predictions.names_in(**gw).next().is_none())
            .count();
        if missing > 0 {
            log::warn!("{} planned gameweek(s) have no forecasts", missing);
        }
        Ok(())
    }
}

/// Fully constructed model; consumed by a single solve
pub struct SquadModel<'a> {
    pool: &'a PlayerPool,
    predictions: &'a Predictions,
    config: &'a Config,
    current: Option<&'a CurrentSquad>,
    variables: ProblemVariables,
    selection: SelectionVars,
    constraints: ConstraintSet,
    objective: Expression,
    transfer_indicators: usize,
}

impl<'a> SquadModel<'a> {
    pub fn selection(&self) -> &SelectionVars {
        &self.selection
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn variable_count(&self) -> usize {
        self.selection.len() + self.transfer_indicators
    }

    pub fn solve(self, backend: &dyn SolverBackend) -> Result<SolveReport> {
        let SquadModel {
            pool,
            predictions,
            config,
            current,
            variables,
            selection,
            constraints,
            objective,
            transfer_indicators: _,
        } = self;

        let problem = Problem {
            variables,
            objective,
            constraints: constraints.into_constraints(),
            readout: selection.readout(),
        };
        let options = SolveOptions {
            time_limit_secs: config.solver.time_limit_secs,
            verbose: config.solver.verbose,
        };

        let started = Instant::now();
        let outcome = backend.solve(problem, &options)?;
        let solve_time_ms = started.elapsed().as_millis() as u64;
        log::info!("{} returned {} in {}ms", backend.name(), outcome.status, solve_time_ms);

        let mut report = SolveReport {
            status: outcome.status,
            backend: backend.name().to_string(),
            solve_time_ms,
            message: outcome.message,
            plan: None,
        };
        if !outcome.status.has_solution() {
            return Ok(report);
        }

        let values = outcome.values.ok_or_else(|| {
            FplOptError::Solver(format!("{} reported {} without an assignment", backend.name(), outcome.status))
        })?;
        let objective_value = outcome.objective_value.unwrap_or_default();

        let decoded = plan::extract_plan(
            &selection,
            &values,
            objective_value,
            pool,
            predictions,
            config,
            current,
        )
        .and_then(|plan| {
            let violations = plan.violations(pool, &config.rules, current);
            if violations.is_empty() {
                Ok(plan)
            } else {
                Err(FplOptError::Solver(format!(
                    "assignment breaks the rules: {}",
                    violations.join("; ")
                )))
            }
        });

        match decoded {
            Ok(plan) => report.plan = Some(plan),
            // the deadline may expire before any valid incumbent exists
            Err(e) if outcome.status == SolveStatus::Feasible => {
                log::warn!("no usable incumbent at the deadline: {}", e);
                report.status = SolveStatus::Timeout;
                report.message = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        log::info!("=== finished: {} ===", report.status);
        Ok(report)
    }
}

/// Builds and solves in one call
pub fn optimise_squad(
    pool: &PlayerPool,
    predictions: &Predictions,
    config: &Config,
    current: Option<&CurrentSquad>,
    backend: &dyn SolverBackend,
) -> Result<SolveReport> {
    let mut builder = SquadModelBuilder::new(pool, predictions, config);
    if let Some(current) = current {
        builder = builder.current_squad(current);
    }
    builder.build()?.solve(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::fixtures::{exact_quota_pool, pool_with_spares};
    use crate::players::{Club, GameWeek, Player, Position};

    const EPS: f64 = 1e-6;

    fn config(horizon: usize) -> Config {
        let mut config = Config::default();
        config.solver.horizon = horizon;
        config
    }

    /// Distinct points per player so the optimal team is unique
    fn ranked_predictions(pool: &PlayerPool, gameweeks: &[GameWeek]) -> Predictions {
        let mut preds = Predictions::new();
        for &gw in gameweeks {
            for (i, player) in pool.players().iter().enumerate() {
                preds.set_points(gw, player.name.clone(), 1.0 + i as f64);
            }
        }
        preds
    }

    fn assert_valid(report: &SolveReport, pool: &PlayerPool, config: &Config, current: Option<&CurrentSquad>) {
        let plan = report.plan.as_ref().expect("plan");
        let violations = plan.violations(pool, &config.rules, current);
        assert!(violations.is_empty(), "{:?}", violations);
    }

    struct StubBackend(BackendOutcome);

    impl SolverBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn solve(&self, _problem: Problem, _options: &SolveOptions) -> Result<BackendOutcome> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_exact_pool_selects_everyone() {
        let pool = exact_quota_pool(60);
        let config = config(1);
        let preds = ranked_predictions(&pool, &[GameWeek(1)]);

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_valid(&report, &pool, &config, None);

        let week = &report.plan.as_ref().unwrap().weeks[0];
        assert_eq!(week.squad.len(), pool.len());
        assert_eq!(week.squad_cost, 900);
    }

    #[test]
    fn test_objective_matches_team_points() {
        let pool = pool_with_spares(2, 60);
        let config = config(1);
        let preds = ranked_predictions(&pool, &[GameWeek(1)]);

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        let plan = report.plan.as_ref().unwrap();
        assert!((plan.objective_value - plan.total_expected_points()).abs() < EPS);
        assert_valid(&report, &pool, &config, None);
    }

    #[test]
    fn test_captain_multiplier_doubles_best_starter() {
        let pool = pool_with_spares(1, 60);
        let mut config = config(1);
        config.scoring.captain_multiplier = 2.0;
        let preds = ranked_predictions(&pool, &[GameWeek(1)]);

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        let plan = report.plan.as_ref().unwrap();
        let week = &plan.weeks[0];

        let best = week
            .team
            .iter()
            .max_by(|a, b| {
                preds
                    .expected_points(GameWeek(1), a)
                    .total_cmp(&preds.expected_points(GameWeek(1), b))
            })
            .unwrap();
        assert_eq!(&week.captain, best);
        assert!((plan.objective_value - plan.total_expected_points()).abs() < EPS);
    }

    #[test]
    fn test_tight_budget_is_infeasible() {
        let pool = pool_with_spares(1, 60);
        let mut config = config(1);
        config.rules.budget = 1;
        let preds = ranked_predictions(&pool, &[GameWeek(1)]);

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Infeasible);
        assert!(report.plan.is_none());
    }

    #[test]
    fn test_incumbent_equal_to_optimum_needs_no_transfer() {
        let pool = pool_with_spares(2, 60);
        let config = config(1);
        let preds = ranked_predictions(&pool, &[GameWeek(1)]);

        let initial = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        let initial_plan = initial.plan.unwrap();
        let current = CurrentSquad::from_names(&pool, &initial_plan.weeks[0].squad).unwrap();

        let report =
            optimise_squad(&pool, &preds, &config, Some(&current), &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_valid(&report, &pool, &config, Some(&current));

        let plan = report.plan.as_ref().unwrap();
        assert!((plan.objective_value - initial_plan.objective_value).abs() < EPS);
        assert_eq!(plan.weeks[0].team, initial_plan.weeks[0].team);
    }

    #[test]
    fn test_transfer_cap_trades_off_across_weeks() {
        // FWD1-3 score in GW1, FWD3-5 in GW2: reaching both optima needs two swaps.
        let pool = pool_with_spares(2, 50);
        let config = config(2);
        let mut preds = Predictions::new();
        for player in pool.players() {
            let (gw1, gw2) = match player.name.as_str() {
                "FWD1" | "FWD2" => (10.0, 0.0),
                "FWD3" => (10.0, 10.0),
                "FWD4" | "FWD5" => (0.0, 10.0),
                _ => (1.0, 1.0),
            };
            preds.set_points(GameWeek(1), player.name.clone(), gw1);
            preds.set_points(GameWeek(2), player.name.clone(), gw2);
        }

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_valid(&report, &pool, &config, None);

        let plan = report.plan.as_ref().unwrap();
        // 38 per week unconstrained; the cap costs one 10-point forward
        assert!((plan.objective_value - 66.0).abs() < EPS, "{}", plan.objective_value);

        let gw2 = plan.week(GameWeek(2)).unwrap();
        assert!(gw2.transfers_in.len() <= 1);
        assert_eq!(gw2.transfers_in.len(), gw2.transfers_out.len());
    }

    #[test]
    fn test_incumbent_limits_first_week() {
        let pool = pool_with_spares(2, 50);
        let config = config(1);
        let current_names = [
            "GK1", "GK2", "DEF1", "DEF2", "DEF3", "DEF4", "DEF5", "MID1", "MID2", "MID3", "MID4",
            "MID5", "FWD1", "FWD2", "FWD3",
        ];
        let current = CurrentSquad::from_names(&pool, &current_names).unwrap();
        let mut preds = Predictions::new();
        preds.set_points(GameWeek(1), "FWD4", 10.0);
        preds.set_points(GameWeek(1), "FWD5", 10.0);

        let report =
            optimise_squad(&pool, &preds, &config, Some(&current), &HighsBackend::new()).unwrap();
        assert_valid(&report, &pool, &config, Some(&current));
        let plan = report.plan.as_ref().unwrap();
        assert!((plan.objective_value - 10.0).abs() < EPS);
        assert_eq!(plan.weeks[0].transfers_in.len(), 1);
    }

    #[test]
    fn test_non_solution_statuses_yield_no_plan() {
        let pool = exact_quota_pool(50);
        let config = config(1);
        let preds = Predictions::new();

        for status in [
            SolveStatus::Infeasible,
            SolveStatus::Unbounded,
            SolveStatus::Error,
            SolveStatus::Timeout,
        ] {
            let backend = StubBackend(BackendOutcome::unsolved(status, "stub"));
            let report = optimise_squad(&pool, &preds, &config, None, &backend).unwrap();
            assert_eq!(report.status, status);
            assert!(report.plan.is_none());
            assert_eq!(report.backend, "stub");
        }
    }

    #[test]
    fn test_feasible_without_incumbent_becomes_timeout() {
        let pool = exact_quota_pool(50);
        let config = config(1);
        let preds = Predictions::new();
        let values = vec![0.0; pool.len() * 3];
        let backend = StubBackend(BackendOutcome::solved(SolveStatus::Feasible, values, 0.0));

        let report = optimise_squad(&pool, &preds, &config, None, &backend).unwrap();
        assert_eq!(report.status, SolveStatus::Timeout);
        assert!(report.plan.is_none());
    }

    /// One starting captain and nothing else: decodes, but breaks the squad rules
    fn lone_captain_values(pool: &PlayerPool) -> Vec<f64> {
        let mut values = vec![0.0; pool.len() * 3];
        values[0..3].copy_from_slice(&[1.0, 1.0, 1.0]);
        values
    }

    #[test]
    fn test_feasible_rule_breaking_assignment_becomes_timeout() {
        let pool = exact_quota_pool(50);
        let config = config(1);
        let preds = Predictions::new();
        let backend = StubBackend(BackendOutcome::solved(
            SolveStatus::Feasible,
            lone_captain_values(&pool),
            0.0,
        ));

        let report = optimise_squad(&pool, &preds, &config, None, &backend).unwrap();
        assert_eq!(report.status, SolveStatus::Timeout);
        assert!(report.plan.is_none());
        assert!(report.message.unwrap().contains("squad"));
    }

    #[test]
    fn test_optimal_rule_breaking_assignment_is_an_error() {
        let pool = exact_quota_pool(50);
        let config = config(1);
        let preds = Predictions::new();
        let backend = StubBackend(BackendOutcome::solved(
            SolveStatus::Optimal,
            lone_captain_values(&pool),
            0.0,
        ));

        let err = optimise_squad(&pool, &preds, &config, None, &backend).unwrap_err();
        assert!(matches!(err, FplOptError::Solver(_)));
    }

    #[test]
    fn test_club_cap_binds() {
        // four Liverpool midfielders outscore everyone, only three may join
        let mut players = pool_with_spares(2, 50).players().to_vec();
        for player in &mut players {
            if ["MID1", "MID2", "MID3", "MID4"].contains(&player.name.as_str()) {
                player.club = Club::Liverpool;
            }
        }
        let pool = PlayerPool::new(players).unwrap();
        let config = config(1);
        let mut preds = Predictions::new();
        for player in pool.players() {
            let points = if player.club == Club::Liverpool { 10.0 } else { 1.0 };
            preds.set_points(GameWeek(1), player.name.clone(), points);
        }

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_valid(&report, &pool, &config, None);

        let week = &report.plan.as_ref().unwrap().weeks[0];
        let liverpool = week
            .squad
            .iter()
            .filter(|name| pool.get(pool.index_of(name).unwrap()).club == Club::Liverpool)
            .count();
        assert_eq!(liverpool, 3);
        assert!((report.plan.unwrap().objective_value - (30.0 + 8.0)).abs() < EPS);
    }

    #[test]
    fn test_budget_binds() {
        // both star forwards together would cost 1080
        let mut players = pool_with_spares(1, 60).players().to_vec();
        for player in &mut players {
            if player.name == "FWD1" || player.name == "FWD2" {
                player.cost = 150;
            }
        }
        let pool = PlayerPool::new(players).unwrap();
        let config = config(1);
        let mut preds = Predictions::new();
        for player in pool.players() {
            let points = match player.name.as_str() {
                "FWD1" => 20.0,
                "FWD2" => 19.0,
                _ => 1.0,
            };
            preds.set_points(GameWeek(1), player.name.clone(), points);
        }

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_valid(&report, &pool, &config, None);

        let week = &report.plan.as_ref().unwrap().weeks[0];
        assert!(week.squad.contains(&"FWD1".to_string()));
        assert!(!week.squad.contains(&"FWD2".to_string()));
        assert_eq!(week.squad_cost, 990);
        assert!(week.squad_cost <= config.rules.budget);
    }

    #[test]
    fn test_tiny_time_limit_never_leaks_an_invalid_plan() {
        let pool = pool_with_spares(30, 50);
        let mut config = config(3);
        config.solver.time_limit_secs = 1e-3;
        let gameweeks = config.solver.gameweeks();
        let preds = ranked_predictions(&pool, &gameweeks);

        let report = optimise_squad(&pool, &preds, &config, None, &HighsBackend::new()).unwrap();
        match report.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                assert_valid(&report, &pool, &config, None)
            }
            SolveStatus::Timeout => assert!(report.plan.is_none()),
            other => panic!("unexpected status {}", other),
        }
    }

    #[test]
    fn test_optimal_without_assignment_is_an_error() {
        let pool = exact_quota_pool(50);
        let config = config(1);
        let preds = Predictions::new();
        let mut outcome = BackendOutcome::unsolved(SolveStatus::Optimal, "");
        outcome.message = None;
        let backend = StubBackend(outcome);

        let err = optimise_squad(&pool, &preds, &config, None, &backend).unwrap_err();
        assert!(matches!(err, FplOptError::Solver(_)));
    }

    #[test]
    fn test_model_size() {
        let pool = exact_quota_pool(50);
        let names: Vec<String> = pool.players().iter().map(|p| p.name.clone()).collect();
        let current = CurrentSquad::from_names(&pool, &names).unwrap();
        let preds = Predictions::new();
        let config = config(2);

        let model = SquadModelBuilder::new(&pool, &preds, &config)
            .current_squad(&current)
            .build()
            .unwrap();
        assert_eq!(model.selection().gameweeks(), &[GameWeek(1), GameWeek(2)]);
        assert_eq!(model.variable_count(), 2 * 15 * 3 + 2 * 15);
        assert_eq!(model.constraints().count(ConstraintFamily::TransferLimit), 2);
        assert_eq!(model.constraints().count(ConstraintFamily::SquadPositionQuota), 8);
        assert_eq!(model.constraints().count(ConstraintFamily::TeamPositionMinimum), 6);
    }

    #[test]
    fn test_malformed_inputs_are_rejected_before_solving() {
        let pool = exact_quota_pool(50);
        let preds = Predictions::new();

        let err = SquadModelBuilder::new(&pool, &preds, &config(0))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, FplOptError::InvalidInput { .. }));

        let short = PlayerPool::new(vec![
            Player::new("GK1", Club::Arsenal, Position::Goalkeeper, 50),
            Player::new("DEF1", Club::Chelsea, Position::Defender, 50),
        ])
        .unwrap();
        let err = SquadModelBuilder::new(&short, &preds, &config(1))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, FplOptError::InvalidInput { .. }));

        let current = CurrentSquad::from_names(&pool, &["GK1", "GK2"]).unwrap();
        let config = config(1);
        let err = SquadModelBuilder::new(&pool, &preds, &config)
            .current_squad(&current)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, FplOptError::InvalidInput { .. }));

        let mut unknown = Predictions::new();
        unknown.set_points(GameWeek(1), "Nobody", 3.0);
        let err = SquadModelBuilder::new(&pool, &unknown, &config)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, FplOptError::InvalidInput { .. }));

        // forecasts outside the planning window are ignored
        let mut later = Predictions::new();
        later.set_points(GameWeek(9), "Nobody", 3.0);
        assert!(SquadModelBuilder::new(&pool, &later, &config).build().is_ok());
    }
}
