use crate::config::ScoringConfig;
use crate::optimize::variables::SelectionVars;
use crate::players::PlayerPool;
use crate::predictions::Predictions;
use good_lp::Expression;

/// 目的関数の構築
///
/// max Σ_g Σ_p (x_{g,p} − ρ v_{g,p}) t_{g,p} + (m − 1) x_{g,p} c_{g,p}
///
/// x: expected points, v: forecast variance, ρ: risk aversion, m: captain multiplier.
/// With the default m = 1 and ρ = 0 only starting-team membership is rewarded.
pub fn assemble_objective(
    selection: &SelectionVars,
    pool: &PlayerPool,
    predictions: &Predictions,
    scoring: &ScoringConfig,
) -> Expression {
    let mut objective = Expression::from(0.0);
    let captain_bonus = scoring.captain_multiplier - 1.0;

    for (gw, week) in selection.iter() {
        for (status, player) in week.iter().zip(pool.players()) {
            let forecast = predictions.get(gw, &player.name);

            let team_coef = forecast.expected_points - scoring.risk_aversion * forecast.variance;
            if team_coef != 0.0 {
                objective += team_coef * status.in_team;
            }

            let captain_coef = captain_bonus * forecast.expected_points;
            if captain_coef != 0.0 {
                objective += captain_coef * status.captain;
            }
        }
    }

    objective
}
