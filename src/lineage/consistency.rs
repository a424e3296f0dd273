//! Agreement between a lineage graph and the labels found in its frames.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::LineageGraph;
use crate::frame::Label;

/// How lineage inconsistencies are treated before computing TRA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// Skip the check
    Off,
    /// Report discrepancies and continue
    #[default]
    Lenient,
    /// Refuse to score an inconsistent lineage
    Strict,
}

/// Discrepancy between declared and observed labels in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDiscrepancy {
    pub frame: usize,
    /// Tracks declared alive but absent from the frame
    pub missing: Vec<Label>,
    /// Labels present in the frame but not declared alive
    pub undeclared: Vec<Label>,
}

/// Result of a consistency check of one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub series: String,
    pub discrepancies: Vec<FrameDiscrepancy>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Compare the tracks declared alive in every frame with the observed labels.
///
/// # Arguments
/// * `series` - Name of the checked series, for reporting
/// * `graph` - Lineage graph of the series
/// * `observed` - (frame, labels present) for every available frame
///
/// Gaps inside the observed frame range that a track covers count as
/// frames with no labels at all. Frames outside that range are not checked.
pub fn check_consistency<'a, I>(series: &str, graph: &LineageGraph, observed: I) -> ConsistencyReport
where
    I: IntoIterator<Item = (usize, &'a [Label])>,
{
    let mut seen_frames = BTreeSet::new();
    let mut discrepancies = Vec::new();

    for (frame, labels) in observed {
        seen_frames.insert(frame);
        if let Some(d) = compare_frame(graph, frame, labels) {
            discrepancies.push(d);
        }
    }

    if let (Some(&first), Some(&last)) = (seen_frames.first(), seen_frames.last()) {
        let mut gaps = BTreeSet::new();
        for track in graph.tracks() {
            let (begin, end) = (track.begin.max(first), track.end.min(last));
            if begin > end {
                continue;
            }
            gaps.extend((begin..=end).filter(|f| !seen_frames.contains(f)));
        }
        for frame in gaps {
            if let Some(d) = compare_frame(graph, frame, &[]) {
                discrepancies.push(d);
            }
        }
    }

    discrepancies.sort_by_key(|d| d.frame);
    ConsistencyReport {
        series: series.to_string(),
        discrepancies,
    }
}

fn compare_frame(graph: &LineageGraph, frame: usize, labels: &[Label]) -> Option<FrameDiscrepancy> {
    let declared: BTreeSet<Label> = graph.alive_at(frame).into_iter().collect();
    let present: BTreeSet<Label> = labels.iter().copied().collect();

    let missing: Vec<Label> = declared.difference(&present).copied().collect();
    let undeclared: Vec<Label> = present.difference(&declared).copied().collect();

    if missing.is_empty() && undeclared.is_empty() {
        None
    } else {
        Some(FrameDiscrepancy {
            frame,
            missing,
            undeclared,
        })
    }
}
