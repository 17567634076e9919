use crate::config::{Config, RulesConfig};
use crate::error::{FplOptError, Result};
use crate::optimize::variables::SelectionVars;
use crate::players::{CurrentSquad, GameWeek, PlayerPool, Position};
use crate::predictions::Predictions;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

/// Squad, starting team and captain of one gameweek
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameWeekSelection {
    pub gameweek: GameWeek,
    pub squad: Vec<String>,
    pub team: Vec<String>,
    pub captain: String,
    pub transfers_in: Vec<String>,
    pub transfers_out: Vec<String>,
    pub squad_cost: u32,
    /// Team points including the captain bonus
    pub expected_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadPlan {
    pub objective_value: f64,
    pub weeks: Vec<GameWeekSelection>,
}

impl SquadPlan {
    pub fn week(&self, gameweek: GameWeek) -> Option<&GameWeekSelection> {
        self.weeks.iter().find(|w| w.gameweek == gameweek)
    }

    pub fn total_expected_points(&self) -> f64 {
        self.weeks.iter().map(|w| w.expected_points).sum()
    }

    /// Re-checks every selection rule against the plan; empty when the plan is valid
    pub fn violations(
        &self,
        pool: &PlayerPool,
        rules: &RulesConfig,
        current: Option<&CurrentSquad>,
    ) -> Vec<String> {
        let mut out = Vec::new();
        let mut previous: Option<BTreeSet<&str>> = current.map(|c| {
            c.members()
                .map(|idx| pool.get(idx).name.as_str())
                .collect()
        });

        for week in &self.weeks {
            let gw = week.gameweek;
            let squad: Vec<_> = week
                .squad
                .iter()
                .filter_map(|name| pool.index_of(name).map(|idx| pool.get(idx)))
                .collect();
            let team: Vec<_> = week
                .team
                .iter()
                .filter_map(|name| pool.index_of(name).map(|idx| pool.get(idx)))
                .collect();

            if squad.len() != week.squad.len() || team.len() != week.team.len() {
                out.push(format!("{}: plan names players outside the pool", gw));
            }
            if squad.len() != rules.squad_size {
                out.push(format!("{}: squad size {} != {}", gw, squad.len(), rules.squad_size));
            }
            let cost: u64 = squad.iter().map(|p| p.cost as u64).sum();
            if cost > rules.budget as u64 {
                out.push(format!("{}: squad cost {} exceeds budget {}", gw, cost, rules.budget));
            }
            for (club, n) in squad.iter().map(|p| p.club).counts() {
                if n > rules.max_per_club {
                    out.push(format!("{}: {} players from {}", gw, n, club));
                }
            }

            let squad_positions = squad.iter().map(|p| p.position).counts();
            let team_positions = team.iter().map(|p| p.position).counts();
            for position in Position::iter() {
                let in_squad = squad_positions.get(&position).copied().unwrap_or(0);
                if in_squad != rules.squad_quota.get(position) {
                    out.push(format!(
                        "{}: {} {} in squad, quota {}",
                        gw,
                        in_squad,
                        position,
                        rules.squad_quota.get(position)
                    ));
                }
                let in_team = team_positions.get(&position).copied().unwrap_or(0);
                if in_team < rules.team_minimum.get(position) {
                    out.push(format!(
                        "{}: {} {} in team, minimum {}",
                        gw,
                        in_team,
                        position,
                        rules.team_minimum.get(position)
                    ));
                }
            }

            if team.len() != rules.team_size {
                out.push(format!("{}: team size {} != {}", gw, team.len(), rules.team_size));
            }
            let squad_names: BTreeSet<&str> = week.squad.iter().map(String::as_str).collect();
            if let Some(outsider) = week.team.iter().find(|n| !squad_names.contains(n.as_str())) {
                out.push(format!("{}: starter {} is not in the squad", gw, outsider));
            }
            if !week.team.contains(&week.captain) {
                out.push(format!("{}: captain {} is not in the team", gw, week.captain));
            }

            if let Some(prev) = &previous {
                let changed = prev.symmetric_difference(&squad_names).count();
                if changed > 2 * rules.max_transfers {
                    out.push(format!(
                        "{}: {} squad memberships changed, limit {} transfer(s)",
                        gw, changed, rules.max_transfers
                    ));
                }
            }
            previous = Some(squad_names);
        }
        out
    }
}

/// 解の構築
///
/// `values` is aligned with `SelectionVars::readout()`.
pub(crate) fn extract_plan(
    selection: &SelectionVars,
    values: &[f64],
    objective_value: f64,
    pool: &PlayerPool,
    predictions: &Predictions,
    config: &Config,
    current: Option<&CurrentSquad>,
) -> Result<SquadPlan> {
    let threshold = config.solver.solution_threshold;
    if values.len() != selection.len() {
        return Err(FplOptError::Solver(format!(
            "expected {} values, backend returned {}",
            selection.len(),
            values.len()
        )));
    }

    let mut weeks = Vec::with_capacity(selection.gameweeks().len());
    let mut previous: Option<BTreeSet<usize>> = current.map(|c| c.members().collect());

    for (pos, &gw) in selection.gameweeks().iter().enumerate() {
        let mut squad = BTreeSet::new();
        let mut team = BTreeSet::new();
        let mut captains = Vec::new();

        for p in 0..pool.len() {
            let offset = selection.readout_offset(pos, p);
            if values[offset] > threshold {
                squad.insert(p);
            }
            if values[offset + 1] > threshold {
                team.insert(p);
            }
            if values[offset + 2] > threshold {
                captains.push(p);
            }
        }

        let &[captain] = captains.as_slice() else {
            return Err(FplOptError::Solver(format!(
                "{}: expected exactly one captain, found {}",
                gw,
                captains.len()
            )));
        };

        let (transfers_in, transfers_out) = match &previous {
            Some(prev) => (
                names(pool, squad.difference(prev).copied()),
                names(pool, prev.difference(&squad).copied()),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let multiplier = config.scoring.captain_multiplier;
        let expected_points = team
            .iter()
            .map(|&p| {
                let points = predictions.expected_points(gw, &pool.get(p).name);
                if p == captain { multiplier * points } else { points }
            })
            .sum();

        weeks.push(GameWeekSelection {
            gameweek: gw,
            squad: names(pool, squad.iter().copied()),
            team: names(pool, team.iter().copied()),
            captain: pool.get(captain).name.clone(),
            transfers_in,
            transfers_out,
            squad_cost: squad.iter().map(|&p| pool.get(p).cost).sum(),
            expected_points,
        });
        previous = Some(squad);
    }

    Ok(SquadPlan {
        objective_value,
        weeks,
    })
}

fn names(pool: &PlayerPool, indices: impl Iterator<Item = usize>) -> Vec<String> {
    indices.map(|p| pool.get(p).name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::fixtures::pool_with_spares;
    use good_lp::ProblemVariables;

    fn selection_for(pool: &PlayerPool, weeks: &[GameWeek]) -> SelectionVars {
        let mut vars = ProblemVariables::new();
        SelectionVars::allocate(&mut vars, pool, weeks)
    }

    /// Sets squad/team/captain values for the named players of one week
    fn assign(
        values: &mut [f64],
        selection: &SelectionVars,
        pool: &PlayerPool,
        pos: usize,
        squad: &[&str],
        bench: &[&str],
        captain: &str,
    ) {
        for name in squad {
            let offset = selection.readout_offset(pos, pool.index_of(name).unwrap());
            values[offset] = 1.0;
            if !bench.contains(name) {
                values[offset + 1] = 1.0;
            }
            if *name == captain {
                values[offset + 2] = 1.0;
            }
        }
    }

    const SQUAD: [&str; 15] = [
        "GK1", "GK2", "DEF1", "DEF2", "DEF3", "DEF4", "DEF5", "MID1", "MID2", "MID3", "MID4",
        "MID5", "FWD1", "FWD2", "FWD3",
    ];
    const BENCH: [&str; 4] = ["GK2", "DEF5", "MID5", "FWD3"];

    #[test]
    fn test_extract_single_week() {
        let pool = pool_with_spares(1, 50);
        let selection = selection_for(&pool, &[GameWeek(1)]);
        let mut values = vec![0.0; selection.len()];
        assign(&mut values, &selection, &pool, 0, &SQUAD, &BENCH, "MID1");

        let mut preds = Predictions::new();
        preds.set_points(GameWeek(1), "MID1", 8.0);
        preds.set_points(GameWeek(1), "FWD1", 5.0);
        preds.set_points(GameWeek(1), "MID5", 9.0); // benched

        let plan = extract_plan(&selection, &values, 13.0, &pool, &preds, &Config::default(), None)
            .unwrap();
        let week = plan.week(GameWeek(1)).unwrap();
        assert_eq!(week.squad.len(), 15);
        assert_eq!(week.team.len(), 11);
        assert_eq!(week.captain, "MID1");
        assert_eq!(week.squad_cost, 750);
        assert_eq!(week.expected_points, 13.0);
        assert!(week.transfers_in.is_empty());
        assert!(plan.violations(&pool, &RulesConfig::default(), None).is_empty());
    }

    #[test]
    fn test_extract_transfers_against_incumbent() {
        let pool = pool_with_spares(1, 50);
        let current = CurrentSquad::from_names(&pool, &SQUAD).unwrap();
        let selection = selection_for(&pool, &[GameWeek(1)]);
        let mut values = vec![0.0; selection.len()];
        let mut squad = SQUAD.to_vec();
        squad.retain(|n| *n != "FWD3");
        squad.push("FWD4");
        let bench = ["GK2", "DEF5", "MID5", "FWD4"];
        assign(&mut values, &selection, &pool, 0, &squad, &bench, "FWD1");

        let plan = extract_plan(
            &selection,
            &values,
            0.0,
            &pool,
            &Predictions::new(),
            &Config::default(),
            Some(&current),
        )
        .unwrap();
        let week = &plan.weeks[0];
        assert_eq!(week.transfers_in, vec!["FWD4".to_string()]);
        assert_eq!(week.transfers_out, vec!["FWD3".to_string()]);
        assert!(
            plan.violations(&pool, &RulesConfig::default(), Some(&current))
                .is_empty()
        );
    }

    #[test]
    fn test_extract_rejects_missing_captain() {
        let pool = pool_with_spares(1, 50);
        let selection = selection_for(&pool, &[GameWeek(1)]);
        let values = vec![0.0; selection.len()];
        let err = extract_plan(
            &selection,
            &values,
            0.0,
            &pool,
            &Predictions::new(),
            &Config::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FplOptError::Solver(_)));
    }

    #[test]
    fn test_extract_rejects_short_assignment() {
        let pool = pool_with_spares(1, 50);
        let selection = selection_for(&pool, &[GameWeek(1)]);
        let result = extract_plan(
            &selection,
            &[1.0, 0.0],
            0.0,
            &pool,
            &Predictions::new(),
            &Config::default(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_violations_detect_broken_rules() {
        let pool = pool_with_spares(1, 50);
        let week = GameWeekSelection {
            gameweek: GameWeek(1),
            squad: vec!["GK1".into(), "DEF1".into()],
            team: vec!["GK1".into(), "MID1".into()],
            captain: "FWD1".into(),
            transfers_in: Vec::new(),
            transfers_out: Vec::new(),
            squad_cost: 100,
            expected_points: 0.0,
        };
        let plan = SquadPlan {
            objective_value: 0.0,
            weeks: vec![week],
        };

        let violations = plan.violations(&pool, &RulesConfig::default(), None);
        assert!(violations.iter().any(|v| v.contains("squad size")));
        assert!(violations.iter().any(|v| v.contains("team size")));
        assert!(violations.iter().any(|v| v.contains("MID1 is not in the squad")));
        assert!(violations.iter().any(|v| v.contains("captain FWD1")));
    }

    #[test]
    fn test_violations_detect_excess_transfers() {
        let pool = pool_with_spares(2, 50);
        let current = CurrentSquad::from_names(&pool, &SQUAD).unwrap();
        let mut squad: Vec<String> = SQUAD.iter().map(|s| s.to_string()).collect();
        squad.retain(|n| n != "FWD2" && n != "FWD3");
        squad.push("FWD4".into());
        squad.push("FWD5".into());
        let bench = ["GK2", "DEF5", "MID5", "FWD5"];
        let team: Vec<String> = squad
            .iter()
            .filter(|n| !bench.contains(&n.as_str()))
            .cloned()
            .collect();
        let plan = SquadPlan {
            objective_value: 0.0,
            weeks: vec![GameWeekSelection {
                gameweek: GameWeek(1),
                captain: team[0].clone(),
                squad,
                team,
                transfers_in: Vec::new(),
                transfers_out: Vec::new(),
                squad_cost: 750,
                expected_points: 0.0,
            }],
        };

        let violations = plan.violations(&pool, &RulesConfig::default(), Some(&current));
        assert_eq!(violations.len(), 1, "{:?}", violations);
        assert!(violations[0].contains("4 squad memberships changed"));
    }
}
