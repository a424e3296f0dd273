//! Diagnostic reporting for measure computations.
//!
//! The measures never log on their own. Callers pass a [`Reporter`], which
//! receives callbacks with structured details; with verbose reporting on,
//! these describe what, where and when a result disagrees with the ground
//! truth.
//!
//! # Thread Safety
//!
//! Frames may be processed by parallel workers, so callbacks take `&self` and
//! reporters must be `Send + Sync`. Use interior mutability to collect data.

use std::sync::Mutex;

use crate::correspondence::Correspondence;
use crate::frame::Label;
use crate::lineage::ConsistencyReport;
use crate::metrics::AogmOperation;

/// Observability trait for the SEG and TRA computations.
///
/// All methods have default empty implementations.
pub trait Reporter: Send + Sync {
    /// Called with the matching of one frame (verbose only).
    fn on_correspondence(&self, _slice: Option<usize>, _correspondence: &Correspondence) {}

    /// Called with the Jaccard index of one GT label (verbose SEG only).
    fn on_jaccard(&self, _frame: usize, _slice: Option<usize>, _gt_label: Label, _jaccard: f64) {}

    /// Called for every graph edit operation (verbose TRA only).
    fn on_aogm_operation(&self, _operation: &AogmOperation) {}

    /// Called with the outcome of a lineage consistency check.
    fn on_consistency(&self, _report: &ConsistencyReport) {}

    /// Called with a final measure value.
    fn on_measure(&self, _name: &str, _value: f64) {}
}

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl Reporter for NoOpReporter {}

/// Reporter forwarding every callback as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for TracingReporter {
    fn on_correspondence(&self, slice: Option<usize>, c: &Correspondence) {
        for &gt in c.gt_labels() {
            match c.matched_res(gt) {
                Some(res) => tracing::debug!(
                    frame = c.frame(),
                    slice = ?slice,
                    gt_label = gt,
                    res_label = res,
                    overlap = c.overlap_fraction(gt),
                    "matched"
                ),
                None => tracing::debug!(frame = c.frame(), slice = ?slice, gt_label = gt, "unmatched"),
            }
        }
    }

    fn on_jaccard(&self, frame: usize, slice: Option<usize>, gt_label: Label, jaccard: f64) {
        tracing::info!("T={} Z={} GT_label={} J={:.6}", frame, slice.unwrap_or(0), gt_label, jaccard);
    }

    fn on_aogm_operation(&self, operation: &AogmOperation) {
        tracing::info!("{}", operation);
    }

    fn on_consistency(&self, report: &ConsistencyReport) {
        if report.is_consistent() {
            tracing::info!("{} lineage is consistent with its frames", report.series);
            return;
        }
        for d in &report.discrepancies {
            tracing::warn!(
                series = %report.series,
                frame = d.frame,
                missing = ?d.missing,
                undeclared = ?d.undeclared,
                "lineage disagrees with frame labels"
            );
        }
    }

    fn on_measure(&self, name: &str, value: f64) {
        tracing::info!("{}: {}", name, value);
    }
}

/// A captured reporter callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Correspondence {
        frame: usize,
        slice: Option<usize>,
        matched: usize,
        unmatched: usize,
    },
    Jaccard {
        frame: usize,
        slice: Option<usize>,
        gt_label: Label,
        jaccard: f64,
    },
    Operation(AogmOperation),
    Consistency(ConsistencyReport),
    Measure { name: String, value: f64 },
}

/// Reporter that records every callback in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ReportEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }

    /// Snapshot of all recorded events, in arrival order.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded AOGM operations.
    pub fn operations(&self) -> Vec<AogmOperation> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Operation(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    /// Last recorded value of a measure.
    pub fn measure(&self, name: &str) -> Option<f64> {
        self.events().into_iter().rev().find_map(|e| match e {
            ReportEvent::Measure { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }
}

impl Reporter for RecordingReporter {
    fn on_correspondence(&self, slice: Option<usize>, c: &Correspondence) {
        let unmatched = c.unmatched_gt().count();
        self.push(ReportEvent::Correspondence {
            frame: c.frame(),
            slice,
            matched: c.gt_labels().len() - unmatched,
            unmatched,
        });
    }

    fn on_jaccard(&self, frame: usize, slice: Option<usize>, gt_label: Label, jaccard: f64) {
        self.push(ReportEvent::Jaccard {
            frame,
            slice,
            gt_label,
            jaccard,
        });
    }

    fn on_aogm_operation(&self, operation: &AogmOperation) {
        self.push(ReportEvent::Operation(operation.clone()));
    }

    fn on_consistency(&self, report: &ConsistencyReport) {
        self.push(ReportEvent::Consistency(report.clone()));
    }

    fn on_measure(&self, name: &str, value: f64) {
        self.push(ReportEvent::Measure {
            name: name.to_string(),
            value,
        });
    }
}
