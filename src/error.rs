use crate::loader::error::LoaderError;
use crate::rotation::error::RotationError;
use crate::utils::station::StationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YooperError {
    /// Unable to load observatory data
    #[error("{0}")]
    Loader(#[from] LoaderError),

    /// Unable to get station reference information
    #[error("{0}")]
    Station(#[from] StationError),

    /// Coordinate rotation failed
    #[error("{0}")]
    Rotation(#[from] RotationError),
}
