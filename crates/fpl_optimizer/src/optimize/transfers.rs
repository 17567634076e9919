use crate::optimize::constraints::{ConstraintFamily, ConstraintSet};
use crate::optimize::variables::SelectionVars;
use crate::players::{CurrentSquad, GameWeek, PlayerPool};
use good_lp::{Expression, ProblemVariables, Variable, variable};

/// 移籍制約の追加
///
/// For each player, d_p ∈ {0,1} marks that squad membership a_p differs from
/// the baseline b_p (previous gameweek, or the incumbent squad before gameweek 1):
///
///   d_p ≥ a_p − b_p,  d_p ≥ b_p − a_p,  d_p ≤ a_p + b_p,  d_p ≤ 2 − a_p − b_p
///
/// A transfer swaps one player out and one in, flipping two memberships, so
/// Σ_p d_p ≤ 2 · max_transfers.
///
/// Gameweek 1 is left unlinked when there is no incumbent squad.
/// Returns the number of indicator variables added.
pub fn link_transfers(
    vars: &mut ProblemVariables,
    set: &mut ConstraintSet,
    selection: &SelectionVars,
    pool: &PlayerPool,
    current: Option<&CurrentSquad>,
    max_transfers: usize,
) -> usize {
    let mut added = 0;

    for (pos, &gw) in selection.gameweeks().iter().enumerate() {
        let week = selection.week(pos);
        let baselines: Vec<Baseline> = if pos == 0 {
            let Some(current) = current else {
                log::debug!("{}: no incumbent squad, transfers unconstrained", gw);
                continue;
            };
            (0..pool.len())
                .map(|p| Baseline::Fixed(current.contains(p)))
                .collect()
        } else {
            selection
                .week(pos - 1)
                .iter()
                .map(|prev| Baseline::Previous(prev.in_squad))
                .collect()
        };

        let changes: Vec<Variable> = week
            .iter()
            .zip(baselines)
            .zip(pool.players())
            .map(|((status, baseline), player)| {
                let name = format!("{}_changed_{}", player.name, gw);
                changed_indicator(vars, set, gw, name, status.in_squad, baseline)
            })
            .collect();
        added += changes.len();

        let total: Expression = changes.into_iter().sum();
        set.push(
            ConstraintFamily::TransferLimit,
            gw,
            total.leq((2 * max_transfers) as f64),
        );
    }

    log::debug!("transfer indicators: {}", added);
    added
}

/// Membership a player is compared against
#[derive(Debug, Clone, Copy)]
enum Baseline {
    Fixed(bool),        // incumbent squad
    Previous(Variable), // s_{g-1,p}
}

impl Baseline {
    fn expression(self) -> Expression {
        match self {
            Baseline::Fixed(member) => Expression::from(if member { 1.0 } else { 0.0 }),
            Baseline::Previous(var) => 1.0 * var,
        }
    }
}

/// XOR linearization of d = a ⊕ b for 0/1 a and b
fn changed_indicator(
    vars: &mut ProblemVariables,
    set: &mut ConstraintSet,
    gw: GameWeek,
    name: String,
    a: Variable,
    baseline: Baseline,
) -> Variable {
    let d = vars.add(variable().binary().name(name));
    let b = baseline.expression();
    let family = ConstraintFamily::TransferChange;

    set.push(family, gw, (d - a + b.clone()).geq(0.0)); // d ≥ a − b
    set.push(family, gw, (d + a - b.clone()).geq(0.0)); // d ≥ b − a
    set.push(family, gw, (d - a - b.clone()).leq(0.0)); // d ≤ a + b
    set.push(family, gw, (d + a + b).leq(2.0)); // d ≤ 2 − a − b
    d
}
