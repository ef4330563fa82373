//! Numeric coercion for free-text numeric columns

use super::is_numeric_dtype;
use crate::error::Result;
use polars::prelude::*;

/// Outcome of coercing one column to Float64
#[derive(Debug, Clone)]
pub struct Coerced {
    pub series: Series,
    /// Non-null cells that could not be parsed and became missing
    pub failures: usize,
}

/// Coerce a column to Float64.
///
/// Cells that do not parse as a number (blank strings, stray whitespace,
/// text) become null instead of failing. Non-finite values (NaN, "inf",
/// "-Infinity") are treated as missing as well.
pub fn coerce_numeric(series: &Series) -> Result<Coerced> {
    let name = series.name().clone();

    if is_numeric_dtype(series.dtype()) || series.dtype() == &DataType::Boolean {
        let cast = series.cast(&DataType::Float64)?;
        let mut failures = 0usize;
        let ca: Float64Chunked = cast
            .f64()?
            .into_iter()
            .map(|opt| {
                let v = opt?;
                if v.is_finite() {
                    Some(v)
                } else {
                    failures += 1;
                    None
                }
            })
            .collect();
        return Ok(Coerced {
            series: ca.with_name(name).into_series(),
            failures,
        });
    }

    let as_str = series.cast(&DataType::String)?;
    let mut failures = 0usize;
    let ca: Float64Chunked = as_str
        .str()?
        .into_iter()
        .map(|opt| {
            let raw = opt?;
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    failures += 1;
                    None
                }
            }
        })
        .collect();

    Ok(Coerced {
        series: ca.with_name(name).into_series(),
        failures,
    })
}
