use crate::constants::{
    CURRENT_SQUAD_HEADER, PLAYER_HEADERS, PREDICTION_HEADERS, PREDICTION_VARIANCE_HEADER,
};
use crate::error::{FplOptError, Result};
use crate::players::{Club, CurrentSquad, GameWeek, Player, PlayerPool, Position};
use crate::predictions::{Forecast, Predictions};

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Reads the player universe from a `name,club,position,cost` CSV file
pub fn read_players_csv<P: AsRef<Path>>(path: P) -> Result<PlayerPool> {
    let file = std::fs::File::open(path)?;
    read_players_from_reader(file)
}

pub fn read_players_from_reader<R: Read>(reader: R) -> Result<PlayerPool> {
    let mut rdr = csv_reader(reader);
    validate_csv_headers(&mut rdr, &PLAYER_HEADERS)?;

    let mut players = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2; // 1-indexed, +1 for header
        if is_blank(&rec) {
            continue;
        }

        let name = get_column_value(&rec, 0, row, PLAYER_HEADERS.len())?;
        let club_label = get_column_value(&rec, 1, row, PLAYER_HEADERS.len())?;
        let position_label = get_column_value(&rec, 2, row, PLAYER_HEADERS.len())?;
        let cost_str = get_column_value(&rec, 3, row, PLAYER_HEADERS.len())?;

        let club = Club::from_str(club_label).map_err(|_| FplOptError::UnknownClub {
            row,
            label: club_label.to_string(),
        })?;
        let position =
            Position::from_str(position_label).map_err(|_| FplOptError::UnknownPosition {
                row,
                label: position_label.to_string(),
            })?;
        let cost = parse_number::<u32>(cost_str, row, "cost")?;

        players.push(Player::new(name, club, position, cost));
    }

    log::debug!("read {} player rows", players.len());
    PlayerPool::new(players)
}

/// Reads forecasts from a `gameweek,name,expected_points[,variance]` CSV file
pub fn read_predictions_csv<P: AsRef<Path>>(path: P) -> Result<Predictions> {
    let file = std::fs::File::open(path)?;
    read_predictions_from_reader(file)
}

pub fn read_predictions_from_reader<R: Read>(reader: R) -> Result<Predictions> {
    let mut rdr = csv_reader(reader);
    validate_csv_headers(&mut rdr, &PREDICTION_HEADERS)?;
    let has_variance = rdr
        .headers()?
        .get(PREDICTION_HEADERS.len())
        .is_some_and(|h| h.eq_ignore_ascii_case(PREDICTION_VARIANCE_HEADER));

    let mut predictions = Predictions::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2;
        if is_blank(&rec) {
            continue;
        }

        let expected = PREDICTION_HEADERS.len();
        let gameweek = parse_number::<u32>(get_column_value(&rec, 0, row, expected)?, row, "gameweek")?;
        if gameweek == 0 {
            return Err(FplOptError::NumberParse {
                row,
                field: "gameweek",
                value: "0".to_string(),
            });
        }
        let name = get_column_value(&rec, 1, row, expected)?;
        let expected_points =
            parse_number::<f64>(get_column_value(&rec, 2, row, expected)?, row, "expected_points")?;
        let variance = match rec.get(3).map(str::trim) {
            Some(v) if has_variance && !v.is_empty() => parse_number::<f64>(v, row, "variance")?,
            _ => 0.0,
        };

        predictions.insert(
            GameWeek(gameweek),
            name,
            Forecast {
                expected_points,
                variance,
            },
        );
    }

    log::debug!("read {} forecasts", predictions.len());
    Ok(predictions)
}

/// Reads the incumbent squad from a single-column `name` CSV file
pub fn read_current_squad_csv<P: AsRef<Path>>(path: P, pool: &PlayerPool) -> Result<CurrentSquad> {
    let file = std::fs::File::open(path)?;
    read_current_squad_from_reader(file, pool)
}

pub fn read_current_squad_from_reader<R: Read>(reader: R, pool: &PlayerPool) -> Result<CurrentSquad> {
    let mut rdr = csv_reader(reader);
    validate_csv_headers(&mut rdr, &[CURRENT_SQUAD_HEADER])?;

    let mut names = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        if is_blank(&rec) {
            continue;
        }
        names.push(get_column_value(&rec, 0, i + 2, 1)?.to_string());
    }
    CurrentSquad::from_names(pool, &names)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true) // allow additional columns
        .from_reader(reader)
}

/// Validates the leading CSV headers match the expected names (case-insensitive)
fn validate_csv_headers<R: Read>(csv_reader: &mut csv::Reader<R>, expected: &[&str]) -> Result<()> {
    let headers = csv_reader
        .headers()
        .map_err(|e| FplOptError::CsvHeader(format!("Failed to read headers: {}", e)))?;

    for (i, want) in expected.iter().enumerate() {
        let got = headers
            .get(i)
            .ok_or_else(|| FplOptError::CsvHeader(format!("Missing '{}' column at index {}", want, i)))?;
        if !got.eq_ignore_ascii_case(want) {
            return Err(FplOptError::CsvHeader(format!(
                "Expected '{}' in column {}, found '{}'",
                want, i, got
            )));
        }
    }
    Ok(())
}

fn is_blank(rec: &StringRecord) -> bool {
    rec.iter().all(|f| f.trim().is_empty())
}

/// Safely extracts a column value from a CSV record
fn get_column_value(
    record: &StringRecord,
    column_index: usize,
    row_number: usize,
    expected: usize,
) -> Result<&str> {
    record
        .get(column_index)
        .map(str::trim)
        .ok_or(FplOptError::CsvRow {
            row: row_number,
            expected,
            got: record.len(),
        })
}

fn parse_number<T: FromStr>(value: &str, row: usize, field: &'static str) -> Result<T> {
    value.parse().map_err(|_| FplOptError::NumberParse {
        row,
        field,
        value: value.to_string(),
    })
}
