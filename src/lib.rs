//! # ctc-measures - Cell Tracking Challenge performance measures
//!
//! Scores automated cell segmentation and tracking results against curated
//! ground truth, following the Cell Tracking Challenge benchmark.
//!
//! ## Features
//!
//! - Per-frame majority-overlap label correspondence between GT and RES volumes
//! - SEG: mean Jaccard index over all ground-truth objects
//! - TRA / AOGM: weighted graph-edit distance between lineage graphs
//! - Lineage table parsing with structural and per-frame consistency checks
//! - Correspondence cache shared by SEG and TRA within one evaluation session
//! - Frame-level parallelism (with the default `rayon` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ctc_measures::io::{DatasetLayout, DirectoryReader};
//! use ctc_measures::metrics::{Evaluator, TraConfig};
//! use ctc_measures::reporter::TracingReporter;
//!
//! let reader = DirectoryReader::new(DatasetLayout::new("01_GT", "01_RES"));
//! let evaluator = Evaluator::new(Arc::new(reader), Arc::new(TracingReporter::new()));
//!
//! let tra = evaluator.tra(&TraConfig::default())?;
//! println!("TRA = {}", tra.value()?);
//! ```

// Public modules
pub mod frame;
pub mod matching;
pub mod correspondence;
pub mod lineage;
pub mod metrics;
pub mod io;
pub mod reporter;

// Re-exports for convenience
pub use frame::{Label, LabeledFrame};
pub use correspondence::{Correspondence, CorrespondenceCache};
pub use lineage::{LineageGraph, TrackRecord, TrackTable};
pub use metrics::{AogmCounts, AogmOperation, AogmResult, Evaluator, PenaltyConfig, SegResult, TraResult};
pub use reporter::{Reporter, NoOpReporter, TracingReporter};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while evaluating a tracking result.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Image pair at frame {frame} does not consist of images of the same size: GT {gt:?}, RES {res:?}")]
        ShapeMismatch {
            frame: usize,
            gt: Vec<usize>,
            res: Vec<usize>,
        },

        #[error("No result frame corresponds to ground-truth frame {frame}")]
        FrameCountMismatch { frame: usize },

        #[error("Frame {frame} specifies slice {slice} but the result image has {ndim} dimension(s) and {depth} slice(s)")]
        InvalidSliceRequest {
            frame: usize,
            slice: usize,
            ndim: usize,
            depth: usize,
        },

        #[error("Malformed track table at row {row}: {reason}")]
        MalformedTrackTable { row: usize, reason: String },

        #[error("Lineage graph of {series} is unavailable: {discrepancies} inconsistent frame(s)")]
        GraphUnavailable { series: String, discrepancies: usize },

        #[error("Cannot parse frame information from file name: {0}")]
        FilenameFormatError(String),

        #[error("Frame {frame} of series {series} not found")]
        FrameNotFound { series: String, frame: usize },

        #[error("Failed to decode frame: {0}")]
        DecodeError(String),

        #[error("Measure is undefined: {0}")]
        UndefinedMeasure(String),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for measure computations
    pub type Result<T> = std::result::Result<T, Error>;
}
