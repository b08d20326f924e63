//! Two-stage rotation of magnetometer data from instrument axes into the station's
//! H (magnetic north), D (magnetic east) and Z (vertical) frame.
use crate::rotation::error::RotationError;
use crate::rotation::filtering::{median, median_filter, odd_window};
use crate::rotation::report::RotationReport;
use crate::utils::station::StationReference;
use log::{debug, info};
use ndarray::{s, Array1, ArrayView1, ArrayView2};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

type Result<T> = std::result::Result<T, RotationError>;

/// Fewest samples after `start_index` that give a usable median
pub const MIN_SAMPLES: usize = 5;
/// Median filter length used when none is given
pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;

/// How far outside [-1, 1] the arccos argument may fall through rounding alone
pub const INCLINATION_ROUNDING_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct RotationOptions {
    /// Leading samples skipped when estimating the orientation
    pub start_index: usize,
    /// Median filter length applied to each rotated component, 0 disables
    pub smoothing_window: usize,
    /// Build and log a `RotationReport`
    pub verbose: bool,
    /// Fewest samples after `start_index` accepted for the median estimate
    pub min_samples: usize,
}

impl Default for RotationOptions {
    fn default() -> Self {
        RotationOptions {
            start_index: 0,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            verbose: true,
            min_samples: MIN_SAMPLES,
        }
    }
}

/// Orientation of the instrument, estimated from the medians of the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationParameters {
    /// radians, azimuth of the observed horizontal field from instrument X
    pub declination: f64,
    /// radians, tilt of the declination-corrected X-Z plane
    pub inclination: f64,
    pub x_obs: f64,
    pub y_obs: f64,
    pub z_obs: f64,
    /// Total field of the observed medians, nT
    pub b_obs: f64,
    /// Median horizontal field after the declination rotation, nT
    pub x_1: f64,
}

/// Rotated field components, time aligned with the input series
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedSeries {
    pub bx: Array1<f64>,
    pub by: Array1<f64>,
    pub bz: Array1<f64>,
    pub parameters: RotationParameters,
    pub report: Option<RotationReport>,
}

/// Solves for the tilt that brings the declination-corrected median field onto the
/// station's reference H and Z.
///
/// # Errors
/// Will return `Err` if the arccos argument falls outside [-1, 1] by more than
/// rounding, which means the station reference and the data are inconsistent.
pub fn solve_inclination(x_1: f64, z_obs: f64, station: &StationReference) -> Result<f64> {
    let argument = (station.bz0 + x_1 / z_obs * station.bh) / (x_1 * x_1 / z_obs + z_obs);
    if argument.is_nan() || argument.abs() > 1.0 + INCLINATION_ROUNDING_TOLERANCE {
        return Err(RotationError::InclinationSolve { argument });
    }
    Ok(argument.clamp(-1.0, 1.0).acos())
}

fn component_median(column: ArrayView1<f64>) -> Result<f64> {
    median(column).ok_or(RotationError::InsufficientData {
        available: 0,
        required: 1,
    })
}

fn check_inputs(field: &ArrayView2<f64>, options: &RotationOptions) -> Result<usize> {
    if field.ncols() != 3 {
        return Err(RotationError::InvalidParameter(format!(
            "Field series must have 3 components per sample, found {}",
            field.ncols()
        )));
    }
    if let Some((i, _)) = field.indexed_iter().find(|(_, x)| !x.is_finite()) {
        return Err(RotationError::InvalidParameter(format!(
            "Field series has a non-finite value at sample {}, component {}",
            i.0, i.1
        )));
    }
    if options.min_samples == 0 {
        return Err(RotationError::InvalidParameter(
            "Minimum sample count must be at least 1".to_string(),
        ));
    }
    let num_samples = field.nrows();
    if num_samples == 0 {
        return Err(RotationError::InsufficientData {
            available: 0,
            required: options.min_samples,
        });
    }
    if options.start_index >= num_samples {
        return Err(RotationError::InvalidParameter(format!(
            "Start index {} is beyond the last of {num_samples} samples",
            options.start_index
        )));
    }
    let available = num_samples - options.start_index;
    if available < options.min_samples {
        return Err(RotationError::InsufficientData {
            available,
            required: options.min_samples,
        });
    }
    let window = odd_window(options.smoothing_window);
    if window > num_samples {
        return Err(RotationError::InvalidParameter(format!(
            "Smoothing window {window} is longer than the {num_samples} sample series"
        )));
    }
    Ok(window)
}

/// Rotates an N x 3 field series (nT, instrument axes) into the station's magnetic frame.
///
/// The declination and inclination are estimated once from the per-axis medians of
/// `field[start_index..]` and then applied to every sample.
///
/// # Errors
/// Will return `Err` if the options are out of range for the series, if too few samples
/// remain after `start_index`, or if no inclination reconciles the data with the station.
pub fn rotate(
    field: ArrayView2<f64>,
    station: &StationReference,
    options: &RotationOptions,
) -> Result<RotatedSeries> {
    let window = check_inputs(&field, options)?;

    let steady = field.slice(s![options.start_index.., ..]);
    let x_obs = component_median(steady.column(0))?;
    let y_obs = component_median(steady.column(1))?;
    let z_obs = component_median(steady.column(2))?;
    let b_obs = (x_obs * x_obs + y_obs * y_obs + z_obs * z_obs).sqrt();

    // Declination: rotate X and Y about the vertical
    let declination = y_obs.atan2(x_obs);
    let (sin_dec, cos_dec) = declination.sin_cos();
    let x = field.column(0);
    let y = field.column(1);
    let z = field.column(2);
    let x_1 = x_obs * cos_dec + y_obs * sin_dec;
    let bx_1 = &x * cos_dec + &y * sin_dec;
    let mut by = &x * (-sin_dec) + &y * cos_dec;

    // Inclination: rotate the new X and Z
    let inclination = solve_inclination(x_1, z_obs, station)?;
    let (sin_inc, cos_inc) = inclination.sin_cos();
    let mut bx = &bx_1 * cos_inc - &z * sin_inc;
    let mut bz = &bx_1 * sin_inc + &z * cos_inc;

    let parameters = RotationParameters {
        declination,
        inclination,
        x_obs,
        y_obs,
        z_obs,
        b_obs,
        x_1,
    };
    debug!(
        "{}: declination {:.4} rad, inclination {:.4} rad from {} samples",
        station.name,
        declination,
        inclination,
        steady.nrows()
    );

    if window > 1 {
        bx = median_filter(bx.view(), window);
        by = median_filter(by.view(), window);
        bz = median_filter(bz.view(), window);
    }

    let report = if options.verbose {
        let report = RotationReport::new(station, &parameters, &bx, &by, &bz);
        for line in report.to_string().lines() {
            info!("{line}");
        }
        Some(report)
    } else {
        None
    };

    Ok(RotatedSeries {
        bx,
        by,
        bz,
        parameters,
        report,
    })
}

/// Rotates a collection of independent field series in parallel.
///
/// # Errors
/// Will return the first `Err` encountered by any series.
pub fn par_rotate<S>(
    series: &[S],
    station: &StationReference,
    options: &RotationOptions,
) -> Result<Vec<RotatedSeries>>
where
    S: AsFieldView + Sync,
{
    let results: Vec<Result<RotatedSeries>> = series
        .par_iter()
        .map(|s| rotate(s.field_view(), station, options))
        .collect();

    let mut rotated = vec![];
    for res in results {
        match res {
            Ok(x) => rotated.push(x),
            Err(e) => Err(e)?,
        }
    }
    Ok(rotated)
}

/// Anything that can lend out an N x 3 field series
pub trait AsFieldView {
    fn field_view(&self) -> ArrayView2<'_, f64>;
}

impl AsFieldView for ndarray::Array2<f64> {
    fn field_view(&self) -> ArrayView2<'_, f64> {
        self.view()
    }
}

impl<'a> AsFieldView for ArrayView2<'a, f64> {
    fn field_view(&self) -> ArrayView2<'_, f64> {
        self.view()
    }
}
