use thiserror::Error;

/// Enum of the possible error variants that may be encountered while loading observatory data
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The container has no dataset with this name
    #[error("Dataset '{0}' not found")]
    MissingDataset(String),

    /// The dataset exists but holds a different kind of data
    #[error("Dataset '{name}' is not {expected}")]
    WrongType { name: String, expected: &'static str },

    /// A time string does not match the expected format
    #[error("Unable to parse time '{0}'")]
    Time(String),

    /// Datasets disagree in length or layout
    #[error("{0}")]
    Shape(String),

    /// The cycle count gives a non-positive sensitivity
    #[error("Invalid cycle count {0}")]
    InvalidCycleCount(f64),

    /// Image index beyond the end of the image stack
    #[error("Image index {index} out of range for {len} images")]
    ImageIndex { index: usize, len: usize },

    /// One or more lines of a text export could not be parsed
    #[error("Corrupted lines: {0}")]
    Parse(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
