pub mod config;
pub mod constants;
pub mod csv_reader;
pub mod error;
pub mod optimize;
pub mod players;
pub mod predictions;
pub mod report;

pub use config::Config;
pub use csv_reader::{read_current_squad_csv, read_players_csv, read_predictions_csv};
pub use error::{FplOptError, Result};
pub use optimize::{
    HighsBackend, SolveReport, SolveStatus, SolverBackend, SquadModelBuilder, SquadPlan,
    optimise_squad,
};
pub use players::{Club, CurrentSquad, GameWeek, Player, PlayerPool, Position};
pub use predictions::{Forecast, Predictions};
pub use report::{log_report, save_report_json};
