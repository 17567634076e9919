use crate::config::RulesConfig;
use crate::optimize::variables::{SelectionStatus, SelectionVars};
use crate::players::{Club, GameWeek, PlayerPool, Position};
use good_lp::{Constraint, Expression};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Constraint families emitted into the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ConstraintFamily {
    SquadSize,
    SquadBudget,
    ClubCap,
    SquadPositionQuota,
    TeamSize,
    TeamPositionMinimum,
    TeamWithinSquad,
    CaptainWithinTeam,
    SingleCaptain,
    TransferChange,
    TransferLimit,
}

pub struct LabelledConstraint {
    pub family: ConstraintFamily,
    pub gameweek: GameWeek,
    pub constraint: Constraint,
}

/// Constraints of one run, labelled for logging and inspection
#[derive(Default)]
pub struct ConstraintSet {
    items: Vec<LabelledConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, family: ConstraintFamily, gameweek: GameWeek, constraint: Constraint) {
        self.items.push(LabelledConstraint {
            family,
            gameweek,
            constraint,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, family: ConstraintFamily) -> usize {
        self.items.iter().filter(|c| c.family == family).count()
    }

    pub fn count_in(&self, family: ConstraintFamily, gameweek: GameWeek) -> usize {
        self.items
            .iter()
            .filter(|c| c.family == family && c.gameweek == gameweek)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelledConstraint> {
        self.items.iter()
    }

    pub fn into_constraints(self) -> Vec<Constraint> {
        self.items.into_iter().map(|c| c.constraint).collect()
    }

    pub fn log_summary(&self) {
        for family in ConstraintFamily::iter() {
            let n = self.count(family);
            if n > 0 {
                log::debug!("constraints {:<20} {}", family.to_string(), n);
            }
        }
        log::info!("number of constraints: {}", self.len());
    }
}

/// 0/1 coefficient for a categorical predicate
fn indicator(predicate: bool) -> f64 {
    if predicate { 1.0 } else { 0.0 }
}

/// Emits every per-gameweek family for all planned gameweeks
pub fn add_gameweek_constraints(
    set: &mut ConstraintSet,
    selection: &SelectionVars,
    pool: &PlayerPool,
    rules: &RulesConfig,
) {
    for (gw, week) in selection.iter() {
        add_squad_size(set, gw, week, rules);
        add_squad_budget(set, gw, week, pool, rules);
        add_club_caps(set, gw, week, pool, rules);
        add_squad_position_quotas(set, gw, week, pool, rules);

        add_team_size(set, gw, week, rules);
        add_team_position_minimums(set, gw, week, pool, rules);
        add_selection_nesting(set, gw, week);
        add_single_captain(set, gw, week);
    }
}

/// Σ_p s_{g,p} = squad_size
pub fn add_squad_size(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    rules: &RulesConfig,
) {
    let sum: Expression = week.iter().map(|s| s.in_squad).sum();
    set.push(
        ConstraintFamily::SquadSize,
        gw,
        sum.eq(rules.squad_size as f64),
    );
}

/// Σ_p cost_p s_{g,p} ≤ budget
pub fn add_squad_budget(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    pool: &PlayerPool,
    rules: &RulesConfig,
) {
    let spend: Expression = week
        .iter()
        .zip(pool.players())
        .map(|(s, player)| player.cost as f64 * s.in_squad)
        .sum();
    set.push(
        ConstraintFamily::SquadBudget,
        gw,
        spend.leq(rules.budget as f64),
    );
}

/// Σ_p [club_p = c] s_{g,p} ≤ max_per_club  ∀c
pub fn add_club_caps(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    pool: &PlayerPool,
    rules: &RulesConfig,
) {
    for club in Club::iter() {
        let sum: Expression = week
            .iter()
            .zip(pool.players())
            .map(|(s, player)| indicator(player.club == club) * s.in_squad)
            .sum();
        set.push(
            ConstraintFamily::ClubCap,
            gw,
            sum.leq(rules.max_per_club as f64),
        );
    }
}

/// Σ_p [pos_p = q] s_{g,p} = squad_quota_q  ∀q
pub fn add_squad_position_quotas(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    pool: &PlayerPool,
    rules: &RulesConfig,
) {
    for position in Position::iter() {
        let sum: Expression = week
            .iter()
            .zip(pool.players())
            .map(|(s, player)| indicator(player.position == position) * s.in_squad)
            .sum();
        set.push(
            ConstraintFamily::SquadPositionQuota,
            gw,
            sum.eq(rules.squad_quota.get(position) as f64),
        );
    }
}

/// Σ_p t_{g,p} = team_size
pub fn add_team_size(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    rules: &RulesConfig,
) {
    let sum: Expression = week.iter().map(|s| s.in_team).sum();
    set.push(ConstraintFamily::TeamSize, gw, sum.eq(rules.team_size as f64));
}

/// Σ_p [pos_p = q] t_{g,p} ≥ team_minimum_q  ∀q with a non-zero minimum
pub fn add_team_position_minimums(
    set: &mut ConstraintSet,
    gw: GameWeek,
    week: &[SelectionStatus],
    pool: &PlayerPool,
    rules: &RulesConfig,
) {
    for position in Position::iter() {
        let minimum = rules.team_minimum.get(position);
        if minimum == 0 {
            continue;
        }
        let sum: Expression = week
            .iter()
            .zip(pool.players())
            .map(|(s, player)| indicator(player.position == position) * s.in_team)
            .sum();
        set.push(
            ConstraintFamily::TeamPositionMinimum,
            gw,
            sum.geq(minimum as f64),
        );
    }
}

/// t_{g,p} ≤ s_{g,p}, c_{g,p} ≤ t_{g,p}
pub fn add_selection_nesting(set: &mut ConstraintSet, gw: GameWeek, week: &[SelectionStatus]) {
    for s in week {
        set.push(
            ConstraintFamily::TeamWithinSquad,
            gw,
            (s.in_team - s.in_squad).leq(0.0),
        );
        set.push(
            ConstraintFamily::CaptainWithinTeam,
            gw,
            (s.captain - s.in_team).leq(0.0),
        );
    }
}

/// Σ_p c_{g,p} = 1
pub fn add_single_captain(set: &mut ConstraintSet, gw: GameWeek, week: &[SelectionStatus]) {
    let sum: Expression = week.iter().map(|s| s.captain).sum();
    set.push(ConstraintFamily::SingleCaptain, gw, sum.eq(1.0));
}
