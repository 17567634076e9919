use crate::error::{FplOptError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Playing position
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Position {
    #[strum(to_string = "GK", serialize = "GKP")]
    Goalkeeper,
    #[strum(to_string = "DEF")]
    Defender,
    #[strum(to_string = "MID")]
    Midfielder,
    #[strum(to_string = "FWD")]
    Forward,
}

/// Real-world clubs. Per-club caps iterate over this fixed set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Club {
    #[strum(to_string = "Arsenal")]
    Arsenal,
    #[strum(to_string = "Aston Villa")]
    AstonVilla,
    #[strum(to_string = "Bournemouth")]
    Bournemouth,
    #[strum(to_string = "Brentford")]
    Brentford,
    #[strum(to_string = "Brighton")]
    Brighton,
    #[strum(to_string = "Chelsea")]
    Chelsea,
    #[strum(to_string = "Crystal Palace")]
    CrystalPalace,
    #[strum(to_string = "Everton")]
    Everton,
    #[strum(to_string = "Fulham")]
    Fulham,
    #[strum(to_string = "Ipswich")]
    Ipswich,
    #[strum(to_string = "Leicester")]
    Leicester,
    #[strum(to_string = "Liverpool")]
    Liverpool,
    #[strum(to_string = "Man City")]
    ManCity,
    #[strum(to_string = "Man Utd")]
    ManUtd,
    #[strum(to_string = "Newcastle")]
    Newcastle,
    #[strum(to_string = "Nott'm Forest", serialize = "Nottingham Forest")]
    NottmForest,
    #[strum(to_string = "Southampton")]
    Southampton,
    #[strum(to_string = "Spurs", serialize = "Tottenham")]
    Spurs,
    #[strum(to_string = "West Ham")]
    WestHam,
    #[strum(to_string = "Wolves")]
    Wolves,
}

/// Planning period. Gameweek 1 is the first period of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameWeek(pub u32);

impl fmt::Display for GameWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GW{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub club: Club,
    pub position: Position,
    /// cost in budget units
    pub cost: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, club: Club, position: Position, cost: u32) -> Self {
        Self {
            name: name.into(),
            club,
            position,
            cost,
        }
    }
}

/// Validated player universe. Indices into `players()` are the player ids used by the model.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    index: HashMap<String, usize>,
}

impl PlayerPool {
    /// Builds the pool, collapsing identical duplicates and rejecting conflicting ones.
    pub fn new(players: Vec<Player>) -> Result<Self> {
        let mut pool = PlayerPool::default();
        for player in players {
            if player.name.trim().is_empty() {
                return Err(FplOptError::invalid_input("player with empty name"));
            }
            match pool.index.get(&player.name) {
                Some(&idx) if pool.players[idx] == player => {
                    log::warn!("duplicate player record ignored: {}", player.name);
                }
                Some(&idx) => {
                    return Err(FplOptError::invalid_input(format!(
                        "conflicting records for player '{}': {:?} vs {:?}",
                        player.name, pool.players[idx], player
                    )));
                }
                None => {
                    pool.index.insert(player.name.clone(), pool.players.len());
                    pool.players.push(player);
                }
            }
        }

        if pool.players.is_empty() {
            return Err(FplOptError::invalid_input("player pool is empty"));
        }
        Ok(pool)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Player {
        &self.players[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn count_by_position(&self, position: Position) -> usize {
        self.players
            .iter()
            .filter(|p| p.position == position)
            .count()
    }

    pub fn total_cost(&self) -> u64 {
        self.players.iter().map(|p| p.cost as u64).sum()
    }
}

/// Incumbent squad held before gameweek 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSquad {
    members: HashSet<usize>,
}

impl CurrentSquad {
    pub fn from_names<S: AsRef<str>>(pool: &PlayerPool, names: &[S]) -> Result<Self> {
        let mut members = HashSet::new();
        for name in names {
            let name = name.as_ref();
            let idx = pool.index_of(name).ok_or_else(|| {
                FplOptError::invalid_input(format!("current squad player '{}' is not in the pool", name))
            })?;
            if !members.insert(idx) {
                return Err(FplOptError::invalid_input(format!(
                    "current squad lists '{}' more than once",
                    name
                )));
            }
        }
        Ok(Self { members })
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.members.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_position_labels() {
        assert_eq!(Position::from_str("GK").unwrap(), Position::Goalkeeper);
        assert_eq!(Position::from_str("gkp").unwrap(), Position::Goalkeeper);
        assert_eq!(Position::from_str("fwd").unwrap(), Position::Forward);
        assert_eq!(Position::Midfielder.to_string(), "MID");
        assert!(Position::from_str("ST").is_err());
    }

    #[test]
    fn test_club_labels() {
        assert_eq!(Club::from_str("Nott'm Forest").unwrap(), Club::NottmForest);
        assert_eq!(Club::from_str("man utd").unwrap(), Club::ManUtd);
        assert_eq!(Club::Spurs.to_string(), "Spurs");
        assert_eq!(Club::iter().count(), 20);
    }

    #[test]
    fn test_gameweek_display_and_order() {
        assert_eq!(GameWeek(2).to_string(), "GW2");
        assert!(GameWeek(1) < GameWeek(2));
    }

    #[test]
    fn test_pool_collapses_identical_duplicates() {
        let p = Player::new("Saka", Club::Arsenal, Position::Midfielder, 100);
        let pool = PlayerPool::new(vec![p.clone(), p]).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.index_of("Saka"), Some(0));
    }

    #[test]
    fn test_pool_rejects_conflicting_duplicates() {
        let a = Player::new("Saka", Club::Arsenal, Position::Midfielder, 100);
        let b = Player::new("Saka", Club::Arsenal, Position::Forward, 100);
        let err = PlayerPool::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, FplOptError::InvalidInput { .. }));
    }

    #[test]
    fn test_pool_rejects_empty() {
        assert!(PlayerPool::new(Vec::new()).is_err());
    }

    #[test]
    fn test_current_squad_validation() {
        let pool = fixtures::exact_quota_pool(50);
        let squad = CurrentSquad::from_names(&pool, &["GK1", "DEF2"]).unwrap();
        assert_eq!(squad.len(), 2);
        assert!(squad.contains(pool.index_of("GK1").unwrap()));

        assert!(CurrentSquad::from_names(&pool, &["Nobody"]).is_err());
        assert!(CurrentSquad::from_names(&pool, &["GK1", "GK1"]).is_err());
    }

    #[test]
    fn test_fixture_pool_counts() {
        let pool = fixtures::exact_quota_pool(50);
        assert_eq!(pool.len(), 15);
        assert_eq!(pool.count_by_position(Position::Goalkeeper), 2);
        assert_eq!(pool.count_by_position(Position::Forward), 3);
        assert_eq!(pool.total_cost(), 750);
    }
}
