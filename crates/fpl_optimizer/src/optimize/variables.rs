use crate::players::{GameWeek, PlayerPool};
use good_lp::{ProblemVariables, Variable, variable};

/// Decision variables of one player in one gameweek
#[derive(Debug, Clone, Copy)]
pub struct SelectionStatus {
    pub in_squad: Variable, // 15-man roster
    pub in_team: Variable,  // starting 11
    pub captain: Variable,
}

/// 決定変数の集合
///
/// s_{g,p}, t_{g,p}, c_{g,p} ∈ {0,1} for every gameweek g and player p.
/// No variable is shared across gameweeks; weeks are coupled only through constraints.
#[derive(Debug, Clone)]
pub struct SelectionVars {
    gameweeks: Vec<GameWeek>,
    statuses: Vec<Vec<SelectionStatus>>, // [week position][player index]
}

impl SelectionVars {
    pub fn allocate(
        vars: &mut ProblemVariables,
        pool: &PlayerPool,
        gameweeks: &[GameWeek],
    ) -> Self {
        let statuses: Vec<Vec<SelectionStatus>> = gameweeks
            .iter()
            .map(|gw| {
                pool.players()
                    .iter()
                    .map(|player| SelectionStatus {
                        in_squad: vars
                            .add(variable().binary().name(format!("{}_in_squad_{}", player.name, gw))),
                        in_team: vars
                            .add(variable().binary().name(format!("{}_in_team_{}", player.name, gw))),
                        captain: vars
                            .add(variable().binary().name(format!("{}_captain_{}", player.name, gw))),
                    })
                    .collect()
            })
            .collect();

        log::debug!(
            "allocated {} selection variables ({} gameweeks x {} players x 3)",
            gameweeks.len() * pool.len() * 3,
            gameweeks.len(),
            pool.len()
        );

        Self {
            gameweeks: gameweeks.to_vec(),
            statuses,
        }
    }

    pub fn gameweeks(&self) -> &[GameWeek] {
        &self.gameweeks
    }

    pub fn player_count(&self) -> usize {
        self.statuses.first().map_or(0, Vec::len)
    }

    /// Variables of the gameweek at `pos` in planning order
    pub fn week(&self, pos: usize) -> &[SelectionStatus] {
        &self.statuses[pos]
    }

    pub fn get(&self, gameweek: GameWeek, player: usize) -> Option<&SelectionStatus> {
        let pos = self.gameweeks.iter().position(|&gw| gw == gameweek)?;
        self.statuses[pos].get(player)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameWeek, &[SelectionStatus])> + '_ {
        self.gameweeks
            .iter()
            .copied()
            .zip(self.statuses.iter().map(Vec::as_slice))
    }

    /// Number of allocated decision variables
    pub fn len(&self) -> usize {
        self.statuses.iter().map(Vec::len).sum::<usize>() * 3
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All variables flattened as (week, player, [squad, team, captain])
    pub fn readout(&self) -> Vec<Variable> {
        self.statuses
            .iter()
            .flatten()
            .flat_map(|s| [s.in_squad, s.in_team, s.captain])
            .collect()
    }

    /// Offset of (week position, player) inside `readout()`
    pub fn readout_offset(&self, pos: usize, player: usize) -> usize {
        (pos * self.player_count() + player) * 3
    }
}
