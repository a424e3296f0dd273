//! Cell Tracking Challenge performance measures.
//!
//! - `SEG` - mean Jaccard index of ground-truth objects ([`score_seg`])
//! - `AOGM` - weighted graph edit cost between lineages ([`compute_aogm`])
//! - `TRA` - AOGM normalized by the cost of building the GT graph ([`evaluate_tra`])
//! - [`Evaluator`] - runs the measures over a dataset, sharing correspondences

mod aogm;
mod config;
mod evaluation;
mod seg;

pub use aogm::{
    compute_aogm, evaluate_tra, AogmCategory, AogmCounts, AogmOperation, AogmResult, TraResult,
};
pub use config::{PenaltyConfig, SegConfig, TraConfig, TraMode};
pub use evaluation::{EvaluationReport, Evaluator};
pub use seg::{score_seg, SegResult};
