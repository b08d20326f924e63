//! Typed record of one observatory data file.
use crate::loader::container::{
    Container, DATE, IMAGES, IMAGE_DATE, MAGNETIC_FIELD, PRESSURE, TEMPERATURE,
};
use crate::loader::error::LoaderError;
use crate::loader::images::LazyImages;
use crate::rotation::error::RotationError;
use crate::rotation::report::RotationReport;
use crate::rotation::rotate::{rotate, RotationOptions, RotationParameters};
use crate::utils::constants::{
    CYCLE_COUNT_GAIN, CYCLE_COUNT_OFFSET, NT_PER_COUNT_SCALE, TIME_FORMAT,
};
use crate::utils::search::sample_seek;
use crate::utils::station::StationReference;
use chrono::NaiveDateTime;
use log::debug;
use ndarray::{Array1, Array2};

type Result<T> = std::result::Result<T, LoaderError>;

/// Magnetometer sensitivity in nT per raw count for the given cycle count.
///
/// # Errors
/// Will return `Err` if the cycle count does not give a finite, positive sensitivity.
pub fn sensitivity(cycle_count: f64) -> Result<f64> {
    let denominator = CYCLE_COUNT_GAIN * cycle_count + CYCLE_COUNT_OFFSET;
    if !cycle_count.is_finite() || denominator <= 0.0 {
        return Err(LoaderError::InvalidCycleCount(cycle_count));
    }
    Ok(NT_PER_COUNT_SCALE / denominator)
}

pub fn parse_time(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|_| LoaderError::Time(raw.to_string()))
}

pub fn parse_times<S: AsRef<str>>(raw: &[S]) -> Result<Vec<NaiveDateTime>> {
    raw.iter().map(|s| parse_time(s.as_ref())).collect()
}

/// All the data from one observatory file
#[derive(Debug, Clone)]
pub struct ObservatoryData {
    pub time: Vec<NaiveDateTime>,
    /// Magnetic field, N x 3, nT in instrument axes
    pub b: Array2<f64>,
    /// Pressure
    pub p: Array1<f64>,
    /// Temperature
    pub t: Array1<f64>,
    /// Rotated field components, filled in by `rotate_mag`
    pub bx: Option<Array1<f64>>,
    pub by: Option<Array1<f64>>,
    pub bz: Option<Array1<f64>>,
    pub images: Option<LazyImages>,
    pub img_time: Vec<NaiveDateTime>,
    pub cycle_count: f64,
}

impl ObservatoryData {
    /// Loads the time series from `container` and scales the magnetometer counts to nT.
    /// The image stack is linked, not read.
    ///
    /// # Errors
    /// Will return `Err` if a required dataset is missing, a time string is malformed,
    /// the datasets disagree in length, or the cycle count is invalid.
    pub fn load<C: Container + ?Sized>(container: &C, cycle_count: f64) -> Result<ObservatoryData> {
        let scale = sensitivity(cycle_count)?;
        let time = parse_times(&container.read_strings(DATE)?)?;

        let (images, img_time) = if container.has_dataset(IMAGES) {
            let img_time = parse_times(&container.read_strings(IMAGE_DATE)?)?;
            let images = container.link_images(IMAGES)?;
            if images.len() != img_time.len() {
                return Err(LoaderError::Shape(format!(
                    "{} images but {} image times",
                    images.len(),
                    img_time.len()
                )));
            }
            (Some(images), img_time)
        } else {
            (None, vec![])
        };

        let b = container.read_matrix(MAGNETIC_FIELD)? * scale;
        let p = container.read_vector(PRESSURE)?;
        let t = container.read_vector(TEMPERATURE)?;

        let n = time.len();
        if b.ncols() != 3 {
            return Err(LoaderError::Shape(format!(
                "Magnetic field has {} components, expected 3",
                b.ncols()
            )));
        }
        let lengths = [
            (MAGNETIC_FIELD, b.nrows()),
            (PRESSURE, p.len()),
            (TEMPERATURE, t.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(LoaderError::Shape(format!(
                    "Dataset '{name}' has {len} samples, expected {n}"
                )));
            }
        }
        if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(LoaderError::Shape(format!(
                "Times are not strictly increasing at sample {}",
                i + 1
            )));
        }
        debug!("Loaded {n} samples with sensitivity {scale:.4} nT/count");

        Ok(ObservatoryData {
            time,
            b,
            p,
            t,
            bx: None,
            by: None,
            bz: None,
            images,
            img_time,
            cycle_count,
        })
    }

    /// Index of the first sample at or after `date_time`
    pub fn seek(&self, date_time: NaiveDateTime) -> Option<usize> {
        sample_seek(&self.time, date_time)
    }

    /// Rotates the magnetic field into the station's magnetic frame, storing the
    /// results in `bx`, `by` and `bz`.
    ///
    /// # Errors
    /// Will return `Err` if the rotation fails; the record is left unchanged.
    pub fn rotate_mag(
        &mut self,
        station: &StationReference,
        options: &RotationOptions,
    ) -> std::result::Result<(RotationParameters, Option<RotationReport>), RotationError> {
        let rotated = rotate(self.b.view(), station, options)?;
        self.bx = Some(rotated.bx);
        self.by = Some(rotated.by);
        self.bz = Some(rotated.bz);
        Ok((rotated.parameters, rotated.report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::container::{Dataset, MemoryContainer};
    use crate::loader::images::MemoryImages;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array4};
    use std::sync::Arc;

    fn container(dates: &[&str]) -> MemoryContainer {
        let n = dates.len();
        let mut container = MemoryContainer::new();
        container.insert(
            DATE,
            Dataset::Strings(dates.iter().map(|s| s.to_string()).collect()),
        );
        container.insert(
            MAGNETIC_FIELD,
            Dataset::Matrix(Array2::from_elem((n, 3), 75.0)),
        );
        container.insert(PRESSURE, Dataset::Vector(Array1::from_elem(n, 1013.0)));
        container.insert(TEMPERATURE, Dataset::Vector(Array1::from_elem(n, 21.5)));
        container
    }

    #[test]
    fn sensitivity_for_default_cycle_count() {
        assert_abs_diff_eq!(sensitivity(200.0).unwrap(), 1000.0 / 74.92, epsilon = 1e-9);
        assert!(matches!(
            sensitivity(-10.0),
            Err(LoaderError::InvalidCycleCount(_))
        ));
        assert!(sensitivity(f64::NAN).is_err());
    }

    #[test]
    fn parses_fixed_time_format() {
        let t = parse_time("2023_02_27_13_05_09").unwrap();
        assert_eq!(t.to_string(), "2023-02-27 13:05:09");
        assert!(matches!(
            parse_time("2023-02-27 13:05:09"),
            Err(LoaderError::Time(_))
        ));
    }

    #[test]
    fn loads_and_scales_field() {
        let c = container(&["2023_02_27_00_00_00", "2023_02_27_00_00_01"]);
        let data = ObservatoryData::load(&c, 200.0).unwrap();
        assert_eq!(data.time.len(), 2);
        assert_abs_diff_eq!(data.b[[1, 2]], 75.0 * 1000.0 / 74.92, epsilon = 1e-9);
        assert_eq!(data.p, array![1013.0, 1013.0]);
        assert!(data.images.is_none());
        assert!(data.img_time.is_empty());
        assert!(data.bx.is_none());
    }

    #[test]
    fn rejects_inconsistent_datasets() {
        let mut c = container(&["2023_02_27_00_00_00", "2023_02_27_00_00_01"]);
        c.insert(PRESSURE, Dataset::Vector(Array1::zeros(3)));
        assert!(matches!(
            ObservatoryData::load(&c, 200.0),
            Err(LoaderError::Shape(_))
        ));

        let c = container(&["2023_02_27_00_00_01", "2023_02_27_00_00_01"]);
        assert!(matches!(
            ObservatoryData::load(&c, 200.0),
            Err(LoaderError::Shape(_))
        ));

        let mut c = container(&["2023_02_27_00_00_00"]);
        c.insert(MAGNETIC_FIELD, Dataset::Matrix(Array2::zeros((1, 2))));
        assert!(matches!(
            ObservatoryData::load(&c, 200.0),
            Err(LoaderError::Shape(_))
        ));
    }

    #[test]
    fn links_images_when_present() {
        let mut c = container(&["2023_02_27_00_00_00"]);
        c.insert(
            IMAGE_DATE,
            Dataset::Strings(vec![
                "2023_02_27_00_00_00".to_string(),
                "2023_02_27_00_01_00".to_string(),
            ]),
        );
        c.insert(
            IMAGES,
            Dataset::Images(Arc::new(MemoryImages::new(Array4::zeros((2, 4, 4, 3))))),
        );
        let data = ObservatoryData::load(&c, 200.0).unwrap();
        let images = data.images.as_ref().expect("image stack linked");
        assert_eq!(images.len(), 2);
        assert_eq!(data.img_time[1].to_string(), "2023-02-27 00:01:00");
        assert_eq!(images.get(1).unwrap().shape(), &[4, 4, 3]);
    }

    #[test]
    fn rejects_image_count_mismatch() {
        let mut c = container(&["2023_02_27_00_00_00"]);
        c.insert(
            IMAGE_DATE,
            Dataset::Strings(vec!["2023_02_27_00_00_00".to_string()]),
        );
        c.insert(
            IMAGES,
            Dataset::Images(Arc::new(MemoryImages::new(Array4::zeros((2, 4, 4, 3))))),
        );
        match ObservatoryData::load(&c, 200.0) {
            Err(LoaderError::Shape(msg)) => {
                assert!(msg.contains("2 images but 1 image times"))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn seeks_by_time() {
        let c = container(&[
            "2023_02_27_00_00_00",
            "2023_02_27_00_00_10",
            "2023_02_27_00_00_20",
        ]);
        let data = ObservatoryData::load(&c, 200.0).unwrap();
        assert_eq!(data.seek(parse_time("2023_02_27_00_00_05").unwrap()), Some(1));
    }
}
