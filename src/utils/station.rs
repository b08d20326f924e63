use log::debug;
use rust_embed::RustEmbed;
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(RustEmbed)]
#[folder = "stations/"]
struct Stations;

const STATION_TABLE: &str = "stations.dat";

/// Environment variable naming a station table that replaces the embedded one
pub const STATION_TABLE_VAR: &str = "YOOPERNET_STATIONS";

#[derive(Error, Debug)]
pub enum StationError {
    /// Unable to open or read a station table
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A column of the station table could not be parsed
    #[error("Unable to read {column} from line {line} of station table")]
    Parse { column: &'static str, line: usize },

    /// No entry in the table has the requested name
    #[error("Station {0} not found in station table")]
    Unknown(String),

    /// The embedded table is missing from the build
    #[error("Embedded station table not found")]
    MissingTable,
}

/// Location and reference geomagnetic field of an observatory.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReference {
    pub name: String,
    pub lat: f64,  // geographic, degrees
    pub lon: f64,  // geographic, degrees
    pub bx0: f64,  // geocentric X, nT
    pub by0: f64,  // geocentric Y, nT
    pub bz0: f64,  // geocentric Z, nT
    pub bh: f64,   // horizontal intensity, nT
    pub b: f64,    // total intensity, nT
}

impl StationReference {
    /// Builds a station reference, deriving H and the total field from the components.
    pub fn new(name: &str, lat: f64, lon: f64, bx0: f64, by0: f64, bz0: f64) -> StationReference {
        StationReference {
            name: name.to_string(),
            lat,
            lon,
            bx0,
            by0,
            bz0,
            bh: bx0.hypot(by0),
            b: (bx0 * bx0 + by0 * by0 + bz0 * bz0).sqrt(),
        }
    }

    /// Looks up a station in the table named by `YOOPERNET_STATIONS`, or in the
    /// embedded table when that is unset.
    pub fn lookup(name: &str) -> Result<StationReference, StationError> {
        let table = env::var_os(STATION_TABLE_VAR).map(PathBuf::from);
        StationReference::lookup_in(table.as_deref(), name)
    }

    /// Looks up a station in `table` if given, otherwise in the embedded table.
    pub fn lookup_in(
        table: Option<&Path>,
        name: &str,
    ) -> Result<StationReference, StationError> {
        match table {
            Some(path) => StationReference::from_file(path, name),
            None => StationReference::from_table(name),
        }
    }

    /// Looks up a station in the table compiled into the crate.
    pub fn from_table(name: &str) -> Result<StationReference, StationError> {
        let table = Stations::get(STATION_TABLE).ok_or(StationError::MissingTable)?;
        parse_station_table(table.data.as_ref(), name)
    }

    /// Looks up a station in a station table file.
    pub fn from_file(path: &Path, name: &str) -> Result<StationReference, StationError> {
        let file = File::open(path)?;
        debug!("Reading station table {}", path.display());
        parse_station_table(BufReader::new(file), name)
    }
}

/// Reads a station table, returning the entry called `name`.
/// Blank lines and lines starting with '#' are skipped.
pub fn parse_station_table<R: BufRead>(
    reader: R,
    name: &str,
) -> Result<StationReference, StationError> {
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let elements: Vec<&str> = trimmed.split_whitespace().collect();
        if elements[0] != name {
            continue;
        }
        let parse = |i: usize, column: &'static str| -> Result<f64, StationError> {
            elements
                .get(i)
                .and_then(|x| x.parse::<f64>().ok())
                .ok_or(StationError::Parse {
                    column,
                    line: line_num,
                })
        };
        return Ok(StationReference {
            name: elements[0].to_string(),
            lat: parse(1, "latitude")?,
            lon: parse(2, "longitude")?,
            bx0: parse(3, "X0")?,
            by0: parse(4, "Y0")?,
            bz0: parse(5, "Z0")?,
            bh: parse(6, "horizontal intensity")?,
            b: parse(7, "total intensity")?,
        });
    }
    Err(StationError::Unknown(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_has_yoopernet() {
        let station = StationReference::from_table("yoopernet").unwrap();
        assert_eq!(station.bh, 19320.0);
        assert_eq!(station.bz0, 49177.0);
        assert_eq!(station.b, 52836.0);
        assert_eq!(station.by0, -2325.0);
    }

    #[test]
    fn derives_intensities() {
        let station = StationReference::new("test", 0.0, 0.0, 3.0, 4.0, 12.0);
        assert_eq!(station.bh, 5.0);
        assert_eq!(station.b, 13.0);
    }

    #[test]
    fn reports_bad_columns_and_unknown_stations() {
        let table = "# comment\n\nabc 1.0 2.0 3.0 4.0 oops 6.0 7.0\n";
        match parse_station_table(table.as_bytes(), "abc") {
            Err(StationError::Parse { column, line }) => {
                assert_eq!(column, "Z0");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(matches!(
            parse_station_table(table.as_bytes(), "xyz"),
            Err(StationError::Unknown(_))
        ));
    }

    fn write_table(file_name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("{file_name}-{}.dat", std::process::id()));
        std::fs::write(
            &path,
            "# name lat lon X0 Y0 Z0 H B\n\
             yoopernet 10.0 20.0 100.0 0.0 200.0 100.0 223.6\n\
             other 11.0 21.0 3.0 4.0 12.0 5.0 13.0\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn reads_station_table_file() {
        let path = write_table("yoopernet-stations-file");
        let station = StationReference::from_file(&path, "other");
        let missing = StationReference::from_file(&path, "absent");
        let _ = std::fs::remove_file(&path);

        let station = station.unwrap();
        assert_eq!(station.name, "other");
        assert_eq!(station.lat, 11.0);
        assert_eq!(station.bh, 5.0);
        assert_eq!(station.b, 13.0);
        assert!(matches!(missing, Err(StationError::Unknown(_))));
        assert!(matches!(
            StationReference::from_file(&path, "other"),
            Err(StationError::Io(_))
        ));
    }

    #[test]
    fn table_override_replaces_embedded_table() {
        let path = write_table("yoopernet-stations-override");
        let from_helper = StationReference::lookup_in(Some(path.as_path()), "yoopernet");
        env::set_var(STATION_TABLE_VAR, &path);
        let from_env = StationReference::lookup("yoopernet");
        env::remove_var(STATION_TABLE_VAR);
        let _ = std::fs::remove_file(&path);

        assert_eq!(from_helper.unwrap().bz0, 200.0);
        assert_eq!(from_env.unwrap().bz0, 200.0);
        assert_eq!(
            StationReference::lookup_in(None, "yoopernet").unwrap().bz0,
            49177.0
        );
    }

    #[test]
    fn short_rows_fail_to_parse() {
        let table = "abc 1.0 2.0 3.0\n";
        assert!(matches!(
            parse_station_table(table.as_bytes(), "abc"),
            Err(StationError::Parse {
                column: "Y0",
                line: 1
            })
        ));
    }
}
