#![doc = include_str!("../README.md")]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::just_underscores_and_digits, clippy::len_without_is_empty)]

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;
pub(crate) use utils::helper;

mod error;
pub use error::{Diagnostic, Error, Result, SegmentFailure};

mod observation;
pub use observation::{Observation, SerialTime};

mod config;
pub use config::{
    Category, CategoryFlag, ClassificationConfig, DEFAULT_DEVIATION_COEFFICIENT,
    DEFAULT_MIN_RUN_LENGTH, DEFAULT_SIGNIFICANCE_LEVEL,
};

mod least_squares;
pub use least_squares::LeastSquares;

mod flagging;
pub use flagging::{Mask, Masks, Summary, compute_masks};

mod segmentation;
pub use segmentation::{Segment, segment, segment_values, segments};

mod regression;
pub use regression::{
    Direction, RegressionReport, RegressionResult, regress_segment, regress_segments,
};

mod selection;
pub use selection::{TrendCategory, TrendDescriptor, classify_trends, select_trends};

mod aggregate;
pub use aggregate::{Aggregation, aggregate_by_time};

mod analysis;
pub use analysis::{Analysis, analyze};
