//! Tools for YooperNet observatory data: loading magnetometer, pressure, temperature
//! and all-sky camera records, and rotating the magnetometer into the station's
//! geomagnetic frame.
use crate::error::YooperError;
use crate::loader::container::read_text_container;
use crate::loader::observatory::ObservatoryData;
use crate::rotation::rotate::RotationOptions;
use crate::utils::station::StationReference;
use std::path::Path;

pub mod error;
pub mod loader;
pub mod rotation;
pub mod utils;

/// Loads a text export of a station day and rotates its magnetometer data.
///
/// # Errors
/// Will return `Err` if the file cannot be read or parsed, or if the rotation fails.
pub fn rotate_file(
    path: &Path,
    station: &StationReference,
    cycle_count: f64,
    options: &RotationOptions,
) -> Result<ObservatoryData, YooperError> {
    let container = read_text_container(path)?;
    let mut data = ObservatoryData::load(&container, cycle_count)?;
    data.rotate_mag(station, options)?;
    Ok(data)
}
