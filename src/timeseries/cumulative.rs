use super::models::TimeSeriesPoint;

/// Running total of a series; dates are kept as-is.
pub fn cumulative(series: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
    series
        .iter()
        .scan(0.0, |sum, point| {
            *sum += point.value;
            Some(TimeSeriesPoint::new(point.date.clone(), *sum))
        })
        .collect()
}
