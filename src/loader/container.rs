//! Named-dataset access to an observatory data file.
use crate::loader::error::LoaderError;
use crate::loader::images::{ImageStack, LazyImages};
use itertools::{Either, Itertools};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

type Result<T> = std::result::Result<T, LoaderError>;

pub const DATE: &str = "date";
pub const MAGNETIC_FIELD: &str = "magnetic field";
pub const PRESSURE: &str = "pressure";
pub const TEMPERATURE: &str = "temperature";
pub const IMAGE_DATE: &str = "images/date";
pub const IMAGES: &str = "images/aurora img";

/// A self-describing container of named datasets
pub trait Container {
    fn has_dataset(&self, name: &str) -> bool;

    fn read_strings(&self, name: &str) -> Result<Vec<String>>;

    fn read_vector(&self, name: &str) -> Result<Array1<f64>>;

    fn read_matrix(&self, name: &str) -> Result<Array2<f64>>;

    /// Links an image dataset without reading any frames
    fn link_images(&self, name: &str) -> Result<LazyImages>;
}

#[derive(Clone)]
pub enum Dataset {
    Strings(Vec<String>),
    Vector(Array1<f64>),
    Matrix(Array2<f64>),
    Images(Arc<dyn ImageStack>),
}

/// Container whose datasets are all held in memory
#[derive(Clone, Default)]
pub struct MemoryContainer {
    datasets: HashMap<String, Dataset>,
}

impl MemoryContainer {
    pub fn new() -> MemoryContainer {
        MemoryContainer::default()
    }

    pub fn insert(&mut self, name: &str, dataset: Dataset) {
        self.datasets.insert(name.to_string(), dataset);
    }

    fn get(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| LoaderError::MissingDataset(name.to_string()))
    }
}

fn wrong_type(name: &str, expected: &'static str) -> LoaderError {
    LoaderError::WrongType {
        name: name.to_string(),
        expected,
    }
}

impl Container for MemoryContainer {
    fn has_dataset(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    fn read_strings(&self, name: &str) -> Result<Vec<String>> {
        match self.get(name)? {
            Dataset::Strings(x) => Ok(x.clone()),
            _ => Err(wrong_type(name, "a string array")),
        }
    }

    fn read_vector(&self, name: &str) -> Result<Array1<f64>> {
        match self.get(name)? {
            Dataset::Vector(x) => Ok(x.clone()),
            _ => Err(wrong_type(name, "a 1-D numeric array")),
        }
    }

    fn read_matrix(&self, name: &str) -> Result<Array2<f64>> {
        match self.get(name)? {
            Dataset::Matrix(x) => Ok(x.clone()),
            _ => Err(wrong_type(name, "a 2-D numeric array")),
        }
    }

    fn link_images(&self, name: &str) -> Result<LazyImages> {
        match self.get(name)? {
            Dataset::Images(x) => Ok(LazyImages::new(x.clone())),
            _ => Err(wrong_type(name, "an image stack")),
        }
    }
}

struct TextSample {
    date: String,
    field: [f64; 3],
    pressure: f64,
    temperature: f64,
}

fn parse_line(line: &str) -> std::result::Result<TextSample, String> {
    let (date, bx, by, bz, p, t) = line
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| "expected 6 columns".to_string())?;
    let num = |x: &str| {
        x.parse::<f64>()
            .map_err(|e| format!("bad value '{x}': {e}"))
    };
    Ok(TextSample {
        date: date.to_string(),
        field: [num(bx)?, num(by)?, num(bz)?],
        pressure: num(p)?,
        temperature: num(t)?,
    })
}

/// Reads a text export of a station day into a `MemoryContainer`.
///
/// Each line holds `date bx by bz pressure temperature`, with the field in raw counts.
/// Blank lines and lines starting with '#' are skipped. Text exports carry no images.
///
/// # Errors
/// Will return `Err` listing every line that could not be parsed.
pub fn parse_text_container<R: BufRead>(reader: R) -> Result<MemoryContainer> {
    let mut lines = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if !(trimmed.is_empty() || trimmed.starts_with('#')) {
            lines.push((idx + 1, trimmed.to_string()));
        }
    }
    let (errors, samples): (Vec<_>, Vec<_>) =
        lines
            .iter()
            .partition_map(|(line_num, line)| match parse_line(line) {
                Err(e) => Either::Left((*line_num, e)),
                Ok(x) => Either::Right(x),
            });
    if !errors.is_empty() {
        Err(LoaderError::Parse(format!("{errors:?}")))?
    }

    let num_samples = samples.len();
    let field = Array2::from_shape_fn((num_samples, 3), |(i, j)| samples[i].field[j]);
    let mut container = MemoryContainer::new();
    container.insert(
        DATE,
        Dataset::Strings(samples.iter().map(|s| s.date.clone()).collect()),
    );
    container.insert(MAGNETIC_FIELD, Dataset::Matrix(field));
    container.insert(
        PRESSURE,
        Dataset::Vector(samples.iter().map(|s| s.pressure).collect()),
    );
    container.insert(
        TEMPERATURE,
        Dataset::Vector(samples.iter().map(|s| s.temperature).collect()),
    );
    Ok(container)
}

/// Reads a text export file into a `MemoryContainer`. See `parse_text_container`.
pub fn read_text_container(path: &Path) -> Result<MemoryContainer> {
    let file = File::open(path)?;
    parse_text_container(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_export() {
        let text = "# date bx by bz p t\n\
                    2023_02_27_01_00_00 100 -20 300.5 1013.2 -4.0\n\
                    \n\
                    2023_02_27_01_00_01 101 -21 301.5 1013.1 -4.1\n";
        let container = parse_text_container(text.as_bytes()).unwrap();
        assert_eq!(
            container.read_strings(DATE).unwrap(),
            vec!["2023_02_27_01_00_00", "2023_02_27_01_00_01"]
        );
        let field = container.read_matrix(MAGNETIC_FIELD).unwrap();
        assert_eq!(field.shape(), &[2, 3]);
        assert_eq!(field[[1, 2]], 301.5);
        assert_eq!(container.read_vector(TEMPERATURE).unwrap()[1], -4.1);
        assert!(!container.has_dataset(IMAGES));
    }

    #[test]
    fn collects_every_bad_line() {
        let text = "2023_02_27_01_00_00 100 -20 300.5 1013.2\n\
                    2023_02_27_01_00_01 101 -21 301.5 1013.1 -4.1\n\
                    2023_02_27_01_00_02 1x1 -21 301.5 1013.1 -4.1\n";
        match parse_text_container(text.as_bytes()) {
            Err(LoaderError::Parse(msg)) => {
                assert!(msg.contains("(1, "));
                assert!(msg.contains("(3, "));
                assert!(!msg.contains("(2, "));
            }
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("corrupted lines were accepted"),
        }
    }

    #[test]
    fn reports_missing_and_mistyped_datasets() {
        let mut container = MemoryContainer::new();
        container.insert(PRESSURE, Dataset::Vector(Array1::zeros(3)));
        assert!(matches!(
            container.read_vector(TEMPERATURE),
            Err(LoaderError::MissingDataset(_))
        ));
        assert!(matches!(
            container.read_matrix(PRESSURE),
            Err(LoaderError::WrongType { .. })
        ));
    }
}
