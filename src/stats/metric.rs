use serde_json::Value;

/// Read `results[0].metrics[0]` from a stats response.
///
/// Returns `None` for a missing response, an empty result set, or a
/// non-numeric metric. Never panics.
pub fn extract_metric_value(response: Option<&Value>) -> Option<f64> {
    response?
        .get("results")?
        .get(0)?
        .get("metrics")?
        .get(0)?
        .as_f64()
}
