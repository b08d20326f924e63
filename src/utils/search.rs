use chrono::NaiveDateTime;

/// Finds the first sample in `times` which occurs at or after `date_time`.
/// `times` must be sorted in increasing order.
pub fn sample_seek(times: &[NaiveDateTime], date_time: NaiveDateTime) -> Option<usize> {
    let idx = times.partition_point(|t| *t < date_time);
    if idx < times.len() {
        Some(idx)
    } else {
        None
    }
}
