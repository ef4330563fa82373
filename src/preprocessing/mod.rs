//! Data preprocessing module
//!
//! Turns a raw customer table into a dense numeric feature matrix:
//! - Target label encoding
//! - Numeric coercion of free-text columns
//! - Missing value imputation
//! - Standard scaling of numeric features
//! - One-hot encoding of categorical features

mod coerce;
mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;
mod target;

pub use coerce::{coerce_numeric, Coerced};
pub use config::PreprocessingConfig;
pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::FeaturePipeline;
pub use scaler::Scaler;
pub use target::{encode_target, EncodedTarget};

use polars::prelude::DataType;

/// Integer and floating point dtypes
pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}
