/// Format of the time strings stored alongside every observatory sample
pub const TIME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

pub const DEFAULT_CYCLE_COUNT: f64 = 200.0;

// sensitivity = NT_PER_COUNT_SCALE / (CYCLE_COUNT_GAIN * cycle_count + CYCLE_COUNT_OFFSET)
pub(crate) const NT_PER_COUNT_SCALE: f64 = 1000.0;
pub(crate) const CYCLE_COUNT_GAIN: f64 = 0.3671;
pub(crate) const CYCLE_COUNT_OFFSET: f64 = 1.5;
