use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use super::{AvoidRegion, PlotMetrics, StitchedSpectrum};
use crate::error::{PreviewError, Result};

/// Stitched spectra and metrics computed outside this crate.
///
/// Expected JSON, one entry per selected association, in plotting order.
/// `null` stands for a non-finite number:
///
/// ```json
/// {
///   "stitched": [
///     { "wls": [...], "fls": [...], "flerrs": [...], "dqs": [...], "title": "" }
///   ],
///   "plot_metrics": [
///     {
///       "optimal_xaxis_range": [1150.2, 1710.9],
///       "y_axis_range": [-1e-15, 4e-14],
///       "median_flux": 1.2e-14,
///       "median_fluxerr": 3e-16,
///       "fluxerr_95th": 9e-16,
///       "avoid_regions": [{ "minwl": 1214.0, "maxwl": 1217.0 }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalResults {
    pub stitched: Vec<StitchedSpectrum>,
    pub metrics: Vec<PlotMetrics>,
}

impl ExternalResults {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let root: JsonValue = serde_json::from_str(text)?;
        let root = as_object(&root, "<root>")?;

        let stitched = records(root, "stitched")?
            .iter()
            .map(StitchedSpectrum::from_record)
            .collect::<Result<Vec<_>>>()?;
        let metrics = records(root, "plot_metrics")?
            .iter()
            .map(PlotMetrics::from_record)
            .collect::<Result<Vec<_>>>()?;

        if stitched.len() != metrics.len() {
            return Err(PreviewError::Contract(format!(
                "{} stitched spectra but {} metrics records",
                stitched.len(),
                metrics.len()
            )));
        }
        Ok(ExternalResults { stitched, metrics })
    }

    pub fn len(&self) -> usize {
        self.stitched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stitched.is_empty()
    }
}

impl StitchedSpectrum {
    /// Decode one stitched-spectrum mapping, failing on the first missing key.
    pub fn from_record(record: &JsonValue) -> Result<Self> {
        let map = as_object(record, "stitched")?;
        let wls = numbers(map, "wls")?;
        let fls = numbers(map, "fls")?;
        let flerrs = numbers(map, "flerrs")?;
        let dqs = numbers(map, "dqs")?
            .into_iter()
            .map(|v| if v.is_finite() { v as i32 } else { 0 })
            .collect::<Vec<_>>();
        let title = match require(map, "title")? {
            JsonValue::String(s) => s.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        };

        let n = wls.len();
        for (key, len) in [("fls", fls.len()), ("flerrs", flerrs.len()), ("dqs", dqs.len())] {
            if len != n {
                return Err(PreviewError::BadValue {
                    key: key.to_string(),
                    reason: format!("{len} values but 'wls' has {n}"),
                });
            }
        }

        Ok(StitchedSpectrum {
            wls,
            fls,
            flerrs,
            dqs,
            title,
        })
    }
}

impl PlotMetrics {
    /// Decode one plot-metrics mapping, failing on the first missing key.
    pub fn from_record(record: &JsonValue) -> Result<Self> {
        let map = as_object(record, "plot_metrics")?;
        let avoid_regions: Vec<AvoidRegion> =
            serde_json::from_value(require(map, "avoid_regions")?.clone()).map_err(|e| {
                PreviewError::BadValue {
                    key: "avoid_regions".to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(PlotMetrics {
            optimal_xaxis_range: pair(map, "optimal_xaxis_range")?,
            y_axis_range: pair(map, "y_axis_range")?,
            median_flux: number(require(map, "median_flux")?, "median_flux")?,
            median_fluxerr: number(require(map, "median_fluxerr")?, "median_fluxerr")?,
            fluxerr_95th: number(require(map, "fluxerr_95th")?, "fluxerr_95th")?,
            avoid_regions,
        })
    }
}

// -- JSON helpers --

fn as_object<'a>(value: &'a JsonValue, what: &str) -> Result<&'a Map<String, JsonValue>> {
    value.as_object().ok_or_else(|| PreviewError::BadValue {
        key: what.to_string(),
        reason: "expected a JSON object".to_string(),
    })
}

fn require<'a>(map: &'a Map<String, JsonValue>, key: &str) -> Result<&'a JsonValue> {
    map.get(key)
        .ok_or_else(|| PreviewError::MissingKey(key.to_string()))
}

fn records<'a>(map: &'a Map<String, JsonValue>, key: &str) -> Result<&'a Vec<JsonValue>> {
    require(map, key)?
        .as_array()
        .ok_or_else(|| PreviewError::BadValue {
            key: key.to_string(),
            reason: "expected an array".to_string(),
        })
}

/// A number, with `null` standing for NaN.
fn number(value: &JsonValue, key: &str) -> Result<f64> {
    match value {
        JsonValue::Null => Ok(f64::NAN),
        v => v.as_f64().ok_or_else(|| PreviewError::BadValue {
            key: key.to_string(),
            reason: format!("'{v}' is not a number"),
        }),
    }
}

fn numbers(map: &Map<String, JsonValue>, key: &str) -> Result<Vec<f64>> {
    let arr = require(map, key)?
        .as_array()
        .ok_or_else(|| PreviewError::BadValue {
            key: key.to_string(),
            reason: "expected an array of numbers".to_string(),
        })?;
    arr.iter().map(|v| number(v, key)).collect()
}

fn pair(map: &Map<String, JsonValue>, key: &str) -> Result<(f64, f64)> {
    match numbers(map, key)?.as_slice() {
        [lo, hi] => Ok((*lo, *hi)),
        other => Err(PreviewError::BadValue {
            key: key.to_string(),
            reason: format!("expected 2 values, got {}", other.len()),
        }),
    }
}
