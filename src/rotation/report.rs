use crate::rotation::filtering::median;
use crate::rotation::rotate::RotationParameters;
use crate::utils::station::StationReference;
use ndarray::{Array1, Zip};
use std::fmt;

/// Comparison of the station's reference field against the observed and rotated data.
///
/// Only a diagnostic: nothing in here feeds back into the rotated arrays. A plotting
/// collaborator can draw `target` as the reference line for each rotated component.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationReport {
    pub target_total: f64,
    pub observed_total: f64,
    pub final_total: f64,
    pub target: [f64; 3],
    pub observed: [f64; 3],
    pub final_mean: [f64; 3],
}

impl RotationReport {
    pub fn new(
        station: &StationReference,
        parameters: &RotationParameters,
        bx: &Array1<f64>,
        by: &Array1<f64>,
        bz: &Array1<f64>,
    ) -> RotationReport {
        let magnitudes: Vec<f64> = Zip::from(bx)
            .and(by)
            .and(bz)
            .map_collect(|x, y, z| (x * x + y * y + z * z).sqrt())
            .to_vec();
        RotationReport {
            target_total: station.b,
            observed_total: parameters.b_obs,
            final_total: median(&magnitudes).unwrap_or(f64::NAN),
            target: [station.bh, 0.0, station.bz0],
            observed: [parameters.x_obs, parameters.y_obs, parameters.z_obs],
            final_mean: [
                bx.mean().unwrap_or(f64::NAN),
                by.mean().unwrap_or(f64::NAN),
                bz.mean().unwrap_or(f64::NAN),
            ],
        }
    }
}

impl fmt::Display for RotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coordinate rotation: X, Y, Z magnetic")?;
        writeln!(
            f,
            "TOTAL FIELD COMPARISON: IGRF={:.1}\tOBS={:.1}\tFINAL={:.1}",
            self.target_total, self.observed_total, self.final_total
        )?;
        let [x, y, z] = self.target;
        writeln!(f, "TARGET VALUES   = {x:8.1}\t{y:8.1}\t{z:8.1}")?;
        let [x, y, z] = self.observed;
        writeln!(f, "STARTING VALUES = {x:8.1}\t{y:8.1}\t{z:8.1}")?;
        let [x, y, z] = self.final_mean;
        write!(f, "FINAL VALUES    = {x:8.1}\t{y:8.1}\t{z:8.1}")
    }
}
