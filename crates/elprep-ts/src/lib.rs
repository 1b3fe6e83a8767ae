//! Temporal resolution reduction for prepared networks.
//!
//! Two strategies, mutually exclusive in a pipeline run:
//!
//! - [`average_every_nhours`]: fixed-size buckets, weightings summed, series averaged.
//! - [`apply_time_segmentation`]: a small number of variable-length segments chosen
//!   by a pluggable [`SegmentationBackend`].

pub mod average;
pub mod registry;
pub mod segment;

#[cfg(feature = "segmentation")]
pub mod agglomerative;

pub use average::{average_every_nhours, parse_rule};
pub use registry::SegmentationKind;
pub use segment::{
    apply_time_segmentation, NormalizedSeries, Segmentation, SegmentationBackend,
    SEGMENTED_SERIES,
};

#[cfg(feature = "segmentation")]
pub use agglomerative::AgglomerativeSegmenter;
