/// Squad composition (15-man roster)
pub const SQUAD_SIZE: usize = 15;
pub const SQUAD_GOALKEEPERS: usize = 2;
pub const SQUAD_DEFENDERS: usize = 5;
pub const SQUAD_MIDFIELDERS: usize = 5;
pub const SQUAD_FORWARDS: usize = 3;

/// Starting lineup (11 of the squad)
pub const TEAM_SIZE: usize = 11;
pub const TEAM_MIN_GOALKEEPERS: usize = 1;
pub const TEAM_MIN_DEFENDERS: usize = 3;
pub const TEAM_MIN_MIDFIELDERS: usize = 0;
pub const TEAM_MIN_FORWARDS: usize = 1;

/// Budget in cost units (0.1m each)
pub const BUDGET: u32 = 1000;
pub const MAX_PER_CLUB: usize = 3;
pub const MAX_TRANSFERS: usize = 1;

/// Solver defaults
pub const DEFAULT_HORIZON: usize = 1;
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 60.0;
pub const SOLUTION_THRESHOLD: f64 = 0.5; // binary read as 1 above this

/// Expected headers in CSV files
pub const PLAYER_HEADERS: [&str; 4] = ["name", "club", "position", "cost"];
pub const PREDICTION_HEADERS: [&str; 3] = ["gameweek", "name", "expected_points"];
pub const PREDICTION_VARIANCE_HEADER: &str = "variance";
pub const CURRENT_SQUAD_HEADER: &str = "name";
