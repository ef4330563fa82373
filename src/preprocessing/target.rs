//! Churn label encoding
//!
//! A strict allow-list: only `"Yes"`, `true`, `1` and `"1"` count as churned.
//! Everything else, including missing values, maps to 0.

use super::is_numeric_dtype;
use crate::error::Result;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Binary labels plus a tally of how the raw values were read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedTarget {
    pub labels: Array1<f64>,
    pub positives: usize,
    /// Values that were neither an affirmative nor a recognised negative
    /// (`"No"`, `false`, `0`, `"0"`) and were silently read as 0
    pub unrecognized: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RawLabel {
    Churned,
    Retained,
    Unrecognized,
}

impl RawLabel {
    fn from_text(s: &str) -> Self {
        match s {
            "Yes" | "1" => RawLabel::Churned,
            "No" | "0" => RawLabel::Retained,
            _ => RawLabel::Unrecognized,
        }
    }

    fn from_f64(v: f64) -> Self {
        if v == 1.0 {
            RawLabel::Churned
        } else if v == 0.0 {
            RawLabel::Retained
        } else {
            RawLabel::Unrecognized
        }
    }
}

/// Encode a raw churn column into 0/1 labels
pub fn encode_target(series: &Series) -> Result<EncodedTarget> {
    let raw: Vec<RawLabel> = match series.dtype() {
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| match v {
                Some(true) => RawLabel::Churned,
                Some(false) => RawLabel::Retained,
                None => RawLabel::Unrecognized,
            })
            .collect(),
        dtype if is_numeric_dtype(dtype) => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map_or(RawLabel::Unrecognized, RawLabel::from_f64))
            .collect(),
        _ => series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map_or(RawLabel::Unrecognized, RawLabel::from_text))
            .collect(),
    };

    let positives = raw.iter().filter(|l| **l == RawLabel::Churned).count();
    let unrecognized = raw.iter().filter(|l| **l == RawLabel::Unrecognized).count();
    if unrecognized > 0 {
        warn!(
            column = %series.name(),
            unrecognized,
            "churn values outside the accepted representations were read as not churned"
        );
    }

    let labels = raw
        .into_iter()
        .map(|l| if l == RawLabel::Churned { 1.0 } else { 0.0 })
        .collect();

    Ok(EncodedTarget { labels, positives, unrecognized })
}
