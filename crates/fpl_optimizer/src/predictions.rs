use crate::players::GameWeek;
use std::collections::{BTreeMap, HashMap};

/// Forecast for one player in one gameweek
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Forecast {
    pub expected_points: f64,
    pub variance: f64,
}

/// Externally computed expected points, keyed by gameweek then player name
#[derive(Debug, Clone, Default)]
pub struct Predictions {
    by_week: BTreeMap<GameWeek, HashMap<String, Forecast>>,
}

impl Predictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gameweek: GameWeek, name: impl Into<String>, forecast: Forecast) {
        self.by_week
            .entry(gameweek)
            .or_default()
            .insert(name.into(), forecast);
    }

    /// Shorthand for a forecast without variance
    pub fn set_points(&mut self, gameweek: GameWeek, name: impl Into<String>, points: f64) {
        self.insert(
            gameweek,
            name,
            Forecast {
                expected_points: points,
                variance: 0.0,
            },
        );
    }

    /// Missing entries forecast zero points
    pub fn get(&self, gameweek: GameWeek, name: &str) -> Forecast {
        self.by_week
            .get(&gameweek)
            .and_then(|week| week.get(name))
            .copied()
            .unwrap_or_default()
    }

    pub fn expected_points(&self, gameweek: GameWeek, name: &str) -> f64 {
        self.get(gameweek, name).expected_points
    }

    pub fn gameweeks(&self) -> impl Iterator<Item = GameWeek> + '_ {
        self.by_week.keys().copied()
    }

    pub fn names_in(&self, gameweek: GameWeek) -> impl Iterator<Item = &str> + '_ {
        self.by_week
            .get(&gameweek)
            .into_iter()
            .flat_map(|week| week.keys().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.by_week.values().all(HashMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.by_week.values().map(HashMap::len).sum()
    }
}
