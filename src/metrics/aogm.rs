//! AOGM: weighted graph edit distance between GT and RES lineage graphs,
//! and the TRA measure normalized from it.
//!
//! Vertices are (track, frame) detections, mapped between the graphs through
//! the per-frame majority-overlap correspondences. The six edit operations
//! needed to turn the RES graph into the GT graph are counted and weighted by
//! a [`PenaltyConfig`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{PenaltyConfig, TraConfig, TraMode};
use crate::correspondence::Correspondence;
use crate::frame::Label;
use crate::lineage::{check_consistency, ConsistencyMode, ConsistencyReport, Edge, EdgeKind, LineageGraph, Vertex};
use crate::reporter::Reporter;
use crate::{Error, Result};

/// Category of a graph edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AogmCategory {
    Split,
    FalseNegative,
    FalsePositive,
    RedundantEdge,
    MissingEdge,
    WrongSemantics,
}

impl AogmCategory {
    /// Heading used when reporting operations of this category.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Split => "Splitting operations (NS)",
            Self::FalseNegative => "False negative vertices (FN)",
            Self::FalsePositive => "False positive vertices (FP)",
            Self::RedundantEdge => "Redundant edges to be deleted (ED)",
            Self::MissingEdge => "Edges to be added (EA)",
            Self::WrongSemantics => "Edges with wrong semantics (EC)",
        }
    }
}

/// One graph edit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AogmOperation {
    /// RES label covering several GT labels in one frame
    Split {
        frame: usize,
        res_label: Label,
        gt_labels: Vec<Label>,
    },
    /// GT label without a RES match
    FalseNegative { frame: usize, gt_label: Label },
    /// RES label without a GT match
    FalsePositive { frame: usize, res_label: Label },
    /// RES edge with no GT counterpart
    RedundantEdge { edge: Edge },
    /// GT edge with no RES counterpart
    MissingEdge { edge: Edge },
    /// GT edge whose RES counterpart has the other kind
    WrongSemantics { edge: Edge, res_kind: EdgeKind },
}

impl AogmOperation {
    pub fn category(&self) -> AogmCategory {
        match self {
            Self::Split { .. } => AogmCategory::Split,
            Self::FalseNegative { .. } => AogmCategory::FalseNegative,
            Self::FalsePositive { .. } => AogmCategory::FalsePositive,
            Self::RedundantEdge { .. } => AogmCategory::RedundantEdge,
            Self::MissingEdge { .. } => AogmCategory::MissingEdge,
            Self::WrongSemantics { .. } => AogmCategory::WrongSemantics,
        }
    }
}

fn fmt_edge(f: &mut fmt::Formatter<'_>, edge: &Edge) -> fmt::Result {
    write!(
        f,
        "[T={} Label={}] -> [T={} Label={}] ({:?})",
        edge.source.frame, edge.source.track, edge.target.frame, edge.target.track, edge.kind
    )
}

impl fmt::Display for AogmOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split {
                frame,
                res_label,
                gt_labels,
            } => write!(f, "NS: T={} Label={} covers GT labels {:?}", frame, res_label, gt_labels),
            Self::FalseNegative { frame, gt_label } => write!(f, "FN: T={} GT_label={}", frame, gt_label),
            Self::FalsePositive { frame, res_label } => write!(f, "FP: T={} Label={}", frame, res_label),
            Self::RedundantEdge { edge } => {
                write!(f, "ED: ")?;
                fmt_edge(f, edge)
            }
            Self::MissingEdge { edge } => {
                write!(f, "EA: ")?;
                fmt_edge(f, edge)
            }
            Self::WrongSemantics { edge, res_kind } => {
                write!(f, "EC: ")?;
                fmt_edge(f, edge)?;
                write!(f, " found as {:?}", res_kind)
            }
        }
    }
}

/// Number of operations per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AogmCounts {
    pub splits: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    pub redundant_edges: usize,
    pub missing_edges: usize,
    pub wrong_semantics: usize,
}

impl AogmCounts {
    fn add(&mut self, category: AogmCategory) {
        match category {
            AogmCategory::Split => self.splits += 1,
            AogmCategory::FalseNegative => self.false_negatives += 1,
            AogmCategory::FalsePositive => self.false_positives += 1,
            AogmCategory::RedundantEdge => self.redundant_edges += 1,
            AogmCategory::MissingEdge => self.missing_edges += 1,
            AogmCategory::WrongSemantics => self.wrong_semantics += 1,
        }
    }

    /// Count of one category.
    pub fn get(&self, category: AogmCategory) -> usize {
        match category {
            AogmCategory::Split => self.splits,
            AogmCategory::FalseNegative => self.false_negatives,
            AogmCategory::FalsePositive => self.false_positives,
            AogmCategory::RedundantEdge => self.redundant_edges,
            AogmCategory::MissingEdge => self.missing_edges,
            AogmCategory::WrongSemantics => self.wrong_semantics,
        }
    }

    /// Total number of operations.
    pub fn total(&self) -> usize {
        self.splits
            + self.false_negatives
            + self.false_positives
            + self.redundant_edges
            + self.missing_edges
            + self.wrong_semantics
    }

    /// Weighted sum of the counts.
    pub fn weighted(&self, penalty: &PenaltyConfig) -> f64 {
        penalty.split * self.splits as f64
            + penalty.false_negative * self.false_negatives as f64
            + penalty.false_positive * self.false_positives as f64
            + penalty.redundant_edge * self.redundant_edges as f64
            + penalty.missing_edge * self.missing_edges as f64
            + penalty.wrong_semantics * self.wrong_semantics as f64
    }
}

/// Outcome of the AOGM computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AogmResult {
    pub counts: AogmCounts,
    /// Weighted edit cost
    pub aogm: f64,
    /// Cost of building the GT graph from an empty graph
    pub aogm0: f64,
    /// 1 - min(AOGM, AOGM0) / AOGM0; None when AOGM0 is 0
    pub tra: Option<f64>,
}

struct Tally<'r> {
    counts: AogmCounts,
    operations: Option<Vec<AogmOperation>>,
    reporter: &'r dyn Reporter,
}

impl<'r> Tally<'r> {
    fn record(&mut self, operation: AogmOperation) {
        self.counts.add(operation.category());
        if let Some(ops) = self.operations.as_mut() {
            ops.push(operation);
        }
    }

    /// Hand collected operations to the reporter, grouped by category.
    fn flush(&mut self) {
        if let Some(mut ops) = self.operations.take() {
            ops.sort_by_key(|op| op.category());
            for op in &ops {
                self.reporter.on_aogm_operation(op);
            }
        }
    }
}

/// Compute the AOGM between a GT and a RES lineage graph.
///
/// # Arguments
/// * `gt` - Ground-truth lineage
/// * `res` - Result lineage
/// * `correspondences` - Label matching of every frame
/// * `penalty` - Operation weights
/// * `verbose` - Report every edit operation
/// * `reporter` - Receives operations and the final values
pub fn compute_aogm<'a, I>(
    gt: &LineageGraph,
    res: &LineageGraph,
    correspondences: I,
    penalty: &PenaltyConfig,
    verbose: bool,
    reporter: &dyn Reporter,
) -> Result<AogmResult>
where
    I: IntoIterator<Item = &'a Correspondence>,
{
    penalty.validate()?;

    let mut frames: BTreeMap<usize, &Correspondence> = BTreeMap::new();
    for c in correspondences {
        if frames.insert(c.frame(), c).is_some() {
            return Err(Error::InvalidConfig(format!(
                "frame {} has more than one correspondence",
                c.frame()
            )));
        }
    }

    let mut tally = Tally {
        counts: AogmCounts::default(),
        operations: verbose.then(Vec::new),
        reporter,
    };

    // vertex operations, frame by frame
    for c in frames.values() {
        for (res_label, gt_labels) in c.split_res() {
            tally.record(AogmOperation::Split {
                frame: c.frame(),
                res_label,
                gt_labels,
            });
        }
        for gt_label in c.unmatched_gt() {
            tally.record(AogmOperation::FalseNegative {
                frame: c.frame(),
                gt_label,
            });
        }
        for res_label in c.unmatched_res() {
            tally.record(AogmOperation::FalsePositive {
                frame: c.frame(),
                res_label,
            });
        }
    }

    // GT edges: missing in RES, or present with the other kind
    for edge in gt.edges() {
        let source = map_to_res(&frames, edge.source);
        let target = map_to_res(&frames, edge.target);
        let found = match (source, target) {
            (Some(s), Some(t)) => res.edge_between(s, t),
            _ => None,
        };
        match found {
            None => tally.record(AogmOperation::MissingEdge { edge: *edge }),
            Some(kind) if kind != edge.kind => tally.record(AogmOperation::WrongSemantics {
                edge: *edge,
                res_kind: kind,
            }),
            Some(_) => {}
        }
    }

    // RES edges without any GT counterpart
    for edge in res.edges() {
        let sources = map_to_gt(&frames, edge.source);
        let targets = map_to_gt(&frames, edge.target);
        let has_counterpart = sources
            .iter()
            .any(|&s| targets.iter().any(|&t| gt.edge_between(s, t).is_some()));
        if !has_counterpart {
            tally.record(AogmOperation::RedundantEdge { edge: *edge });
        }
    }

    tally.flush();

    let counts = tally.counts;
    let aogm = counts.weighted(penalty);
    let aogm0 = penalty.false_negative * gt.vertex_count() as f64
        + penalty.missing_edge * gt.edge_count() as f64;
    let tra = (aogm0 > 0.0).then(|| 1.0 - aogm.min(aogm0) / aogm0);

    if verbose {
        tracing::debug!(
            ns = counts.splits,
            fn_ = counts.false_negatives,
            fp = counts.false_positives,
            ed = counts.redundant_edges,
            ea = counts.missing_edges,
            ec = counts.wrong_semantics,
            "AOGM operation counts"
        );
    }
    reporter.on_measure("AOGM", aogm);
    reporter.on_measure("AOGM0", aogm0);

    Ok(AogmResult {
        counts,
        aogm,
        aogm0,
        tra,
    })
}

fn map_to_res(frames: &BTreeMap<usize, &Correspondence>, v: Vertex) -> Option<Vertex> {
    frames
        .get(&v.frame)
        .and_then(|c| c.matched_res(v.track))
        .map(|r| Vertex::new(r, v.frame))
}

fn map_to_gt(frames: &BTreeMap<usize, &Correspondence>, v: Vertex) -> Vec<Vertex> {
    frames
        .get(&v.frame)
        .map(|c| {
            c.matched_gt(v.track)
                .into_iter()
                .map(|g| Vertex::new(g, v.frame))
                .collect()
        })
        .unwrap_or_default()
}

/// Outcome of the tracking measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraResult {
    pub mode: TraMode,
    pub aogm: AogmResult,
    /// Consistency check of the GT lineage, when performed
    pub gt_consistency: Option<ConsistencyReport>,
    /// Consistency check of the RES lineage, when performed
    pub res_consistency: Option<ConsistencyReport>,
}

impl TraResult {
    /// The value requested by the mode: TRA or the raw AOGM.
    pub fn value(&self) -> Result<f64> {
        match self.mode {
            TraMode::Aogm => Ok(self.aogm.aogm),
            TraMode::Tra => self.aogm.tra.ok_or_else(|| {
                Error::UndefinedMeasure("TRA: ground-truth lineage is empty".to_string())
            }),
        }
    }
}

/// Check lineage consistency per the configured mode, then compute AOGM.
///
/// In strict mode an inconsistent lineage yields `GraphUnavailable`; in
/// lenient mode discrepancies are only reported.
pub fn evaluate_tra(
    gt: &LineageGraph,
    res: &LineageGraph,
    correspondences: &[&Correspondence],
    config: &TraConfig,
    reporter: &dyn Reporter,
) -> Result<TraResult> {
    let (gt_consistency, res_consistency) = match config.consistency {
        ConsistencyMode::Off => (None, None),
        mode => {
            let gt_report = check_consistency(
                "GT",
                gt,
                correspondences.iter().map(|c| (c.frame(), c.gt_labels())),
            );
            let res_report = check_consistency(
                "RES",
                res,
                correspondences.iter().map(|c| (c.frame(), c.res_labels())),
            );
            reporter.on_consistency(&gt_report);
            reporter.on_consistency(&res_report);

            if mode == ConsistencyMode::Strict {
                for report in [&gt_report, &res_report] {
                    if !report.is_consistent() {
                        return Err(Error::GraphUnavailable {
                            series: report.series.clone(),
                            discrepancies: report.discrepancies.len(),
                        });
                    }
                }
            }
            (Some(gt_report), Some(res_report))
        }
    };

    let aogm = compute_aogm(
        gt,
        res,
        correspondences.iter().copied(),
        &config.penalty,
        config.verbose,
        reporter,
    )?;

    let result = TraResult {
        mode: config.mode,
        aogm,
        gt_consistency,
        res_consistency,
    };
    if let (TraMode::Tra, Some(tra)) = (config.mode, result.aogm.tra) {
        reporter.on_measure("TRA", tra);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::LabeledFrame;
    use crate::reporter::{NoOpReporter, RecordingReporter};
    use approx::assert_relative_eq;

    fn graph(text: &str) -> LineageGraph {
        LineageGraph::from_table(&text.parse().unwrap()).unwrap()
    }

    /// One 1-D frame per entry, each label drawn as a run of 4 voxels.
    fn frames(labels: &[&[u32]]) -> Vec<LabeledFrame> {
        labels
            .iter()
            .map(|ls| {
                let mut data = vec![0; 16];
                for (slot, &l) in ls.iter().enumerate() {
                    for v in &mut data[slot * 4..slot * 4 + 4] {
                        *v = l;
                    }
                }
                LabeledFrame::new(vec![16], data).unwrap()
            })
            .collect()
    }

    fn correspondences(gt: &[LabeledFrame], res: &[LabeledFrame]) -> Vec<Correspondence> {
        gt.iter()
            .zip(res)
            .enumerate()
            .map(|(t, (g, r))| Correspondence::compute(t, g, r).unwrap())
            .collect()
    }

    fn aogm(gt_g: &LineageGraph, res_g: &LineageGraph, cs: &[Correspondence]) -> AogmResult {
        compute_aogm(gt_g, res_g, cs, &PenaltyConfig::default(), false, &NoOpReporter).unwrap()
    }

    // ===== Test Identity =====

    #[test]
    fn test_self_comparison_is_perfect() {
        let g = graph("1 0 2 0\n2 3 4 1\n3 3 4 1\n");
        let f = frames(&[&[1], &[1], &[1], &[2, 3], &[2, 3]]);
        let cs = correspondences(&f, &f);
        let r = aogm(&g, &g, &cs);

        assert_eq!(r.counts, AogmCounts::default());
        assert_eq!(r.aogm, 0.0);
        assert_eq!(r.tra, Some(1.0));
    }

    // ===== Test Reference Cost =====

    #[test]
    fn test_empty_result_costs_aogm0() {
        let g = graph("1 0 2 0\n2 3 4 1\n3 3 4 1\n");
        let f = frames(&[&[1], &[1], &[1], &[2, 3], &[2, 3]]);
        let empty = frames(&[&[], &[], &[], &[], &[]]);
        let cs = correspondences(&f, &empty);
        let r = aogm(&g, &LineageGraph::default(), &cs);

        // 7 vertices, 2 + 1 + 1 temporal and 2 division edges
        assert_eq!(r.counts.false_negatives, 7);
        assert_eq!(r.counts.missing_edges, 6);
        assert_relative_eq!(r.aogm, 10.0 * 7.0 + 1.5 * 6.0);
        assert_relative_eq!(r.aogm0, r.aogm);
        assert_eq!(r.tra, Some(0.0));
    }

    #[test]
    fn test_tra_clamped_at_zero() {
        let g = graph("1 0 0 0\n");
        let gt_f = frames(&[&[1]]);
        // many spurious objects on top of a miss
        let res_f = frames(&[&[0, 5, 6, 7]]);
        let res_g = graph("5 0 0 0\n6 0 0 0\n7 0 0 0\n");
        let cs = correspondences(&gt_f, &res_f);
        let r = compute_aogm(
            &g,
            &res_g,
            &cs,
            &PenaltyConfig::new(1.0, 1.0, 100.0, 1.0, 1.0, 1.0).unwrap(),
            false,
            &NoOpReporter,
        )
        .unwrap();
        assert!(r.aogm > r.aogm0);
        assert_eq!(r.tra, Some(0.0));
    }

    #[test]
    fn test_empty_gt_has_no_tra() {
        let f = frames(&[&[4]]);
        let empty = frames(&[&[]]);
        let cs = correspondences(&empty, &f);
        let r = aogm(&LineageGraph::default(), &graph("4 0 0 0\n"), &cs);
        assert_eq!(r.counts.false_positives, 1);
        assert_eq!(r.aogm0, 0.0);
        assert_eq!(r.tra, None);
    }

    // ===== Test Vertex Operations =====

    #[test]
    fn test_split_counted_once_per_res_label() {
        // RES 1 covers GT 1, 2 and 3 in frame 0
        let gt_f = vec![LabeledFrame::new(vec![6], vec![1, 1, 2, 2, 3, 3]).unwrap()];
        let res_f = vec![LabeledFrame::new(vec![6], vec![1, 1, 1, 1, 1, 1]).unwrap()];
        let cs = correspondences(&gt_f, &res_f);
        let r = aogm(&graph("1 0 0 0\n2 0 0 0\n3 0 0 0\n"), &graph("1 0 0 0\n"), &cs);
        assert_eq!(r.counts.splits, 1);
        assert_eq!(r.counts.false_negatives, 0);
        assert_eq!(r.counts.false_positives, 0);
    }

    #[test]
    fn test_false_negative_and_positive() {
        let gt_f = frames(&[&[1, 2]]);
        let res_f = frames(&[&[1, 0, 9]]);
        let cs = correspondences(&gt_f, &res_f);
        let r = aogm(&graph("1 0 0 0\n2 0 0 0\n"), &graph("1 0 0 0\n9 0 0 0\n"), &cs);
        assert_eq!(r.counts.false_negatives, 1);
        assert_eq!(r.counts.false_positives, 1);
        assert_relative_eq!(r.aogm, 11.0);
    }

    // ===== Test Edge Operations =====

    #[test]
    fn test_missing_division_link() {
        let gt_g = graph("1 0 4 0\n2 5 9 1\n");
        let res_g = graph("1 0 4 0\n2 5 9 0\n");
        let f = frames(&[&[1], &[1], &[1], &[1], &[1], &[2], &[2], &[2], &[2], &[2]]);
        let cs = correspondences(&f, &f);
        let r = aogm(&gt_g, &res_g, &cs);

        assert_eq!(r.counts.missing_edges, 1);
        assert_eq!(r.counts.total(), 1);
        assert_relative_eq!(r.aogm, 1.5);
    }

    #[test]
    fn test_redundant_link() {
        // the mutation in the other direction: RES links tracks GT keeps apart
        let gt_g = graph("1 0 1 0\n2 2 3 0\n");
        let res_g = graph("1 0 1 0\n2 2 3 1\n");
        let f = frames(&[&[1], &[1], &[2], &[2]]);
        let cs = correspondences(&f, &f);
        let r = aogm(&gt_g, &res_g, &cs);
        assert_eq!(r.counts.redundant_edges, 1);
        assert_eq!(r.counts.total(), 1);
    }

    #[test]
    fn test_wrong_semantics() {
        // GT keeps one track; RES relabels it after frame 1 and links with a parent edge
        let gt_g = graph("1 0 3 0\n");
        let res_g = graph("1 0 1 0\n2 2 3 1\n");
        let gt_f = frames(&[&[1], &[1], &[1], &[1]]);
        let res_f = frames(&[&[1], &[1], &[2], &[2]]);
        let cs = correspondences(&gt_f, &res_f);
        let r = aogm(&gt_g, &res_g, &cs);

        assert_eq!(r.counts.wrong_semantics, 1);
        assert_eq!(r.counts.missing_edges, 0);
        assert_eq!(r.counts.redundant_edges, 0);
    }

    #[test]
    fn test_edges_of_false_positive_are_redundant() {
        let gt_g = graph("1 0 1 0\n");
        let res_g = graph("1 0 1 0\n7 0 1 0\n");
        let gt_f = frames(&[&[1], &[1]]);
        let res_f = frames(&[&[1, 7], &[1, 7]]);
        let cs = correspondences(&gt_f, &res_f);
        let r = aogm(&gt_g, &res_g, &cs);
        assert_eq!(r.counts.false_positives, 2);
        assert_eq!(r.counts.redundant_edges, 1);
    }

    #[test]
    fn test_switched_identities() {
        // two tracks whose RES labels swap between frame 0 and 1
        let gt_g = graph("1 0 1 0\n2 0 1 0\n");
        let res_g = graph("1 0 1 0\n2 0 1 0\n");
        let gt_f = frames(&[&[1, 2], &[1, 2]]);
        let res_f = frames(&[&[1, 2], &[2, 1]]);
        let cs = correspondences(&gt_f, &res_f);
        let r = aogm(&gt_g, &res_g, &cs);
        assert_eq!(r.counts.missing_edges, 2);
        assert_eq!(r.counts.redundant_edges, 2);
    }

    // ===== Test Weights =====

    #[test]
    fn test_monotonic_in_every_weight() {
        let gt_g = graph("1 0 3 0\n2 0 3 0\n");
        let res_g = graph("1 0 1 0\n3 2 3 1\n9 0 0 0\n");
        let gt_f = frames(&[&[1, 2], &[1, 2], &[1, 2], &[1, 2]]);
        let res_f = frames(&[&[1, 0, 9], &[1, 1], &[3], &[3]]);
        let cs = correspondences(&gt_f, &res_f);

        let base = PenaltyConfig::default();
        let base_cost = compute_aogm(&gt_g, &res_g, &cs, &base, false, &NoOpReporter).unwrap().aogm;

        let bumps: [fn(&mut PenaltyConfig); 6] = [
            |p| p.split += 1.0,
            |p| p.false_negative += 1.0,
            |p| p.false_positive += 1.0,
            |p| p.redundant_edge += 1.0,
            |p| p.missing_edge += 1.0,
            |p| p.wrong_semantics += 1.0,
        ];
        for bump in bumps {
            let mut p = base;
            bump(&mut p);
            let cost = compute_aogm(&gt_g, &res_g, &cs, &p, false, &NoOpReporter).unwrap().aogm;
            assert!(cost >= base_cost);
        }
    }

    // ===== Test Reporting =====

    #[test]
    fn test_operations_reported_by_category() {
        let gt_g = graph("1 0 1 0\n2 0 1 0\n");
        let res_g = graph("1 0 1 0\n");
        let gt_f = frames(&[&[1, 2], &[1, 2]]);
        let res_f = frames(&[&[1, 0], &[1, 0]]);
        let cs = correspondences(&gt_f, &res_f);
        let reporter = RecordingReporter::new();
        let r = compute_aogm(&gt_g, &res_g, &cs, &PenaltyConfig::default(), true, &reporter).unwrap();

        let ops = reporter.operations();
        assert_eq!(ops.len(), r.counts.total());
        let categories: Vec<_> = ops.iter().map(|op| op.category()).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        assert_eq!(
            ops[0],
            AogmOperation::FalseNegative {
                frame: 0,
                gt_label: 2
            }
        );
        assert_eq!(reporter.measure("AOGM"), Some(r.aogm));
    }

    #[test]
    fn test_operation_display() {
        let op = AogmOperation::MissingEdge {
            edge: Edge {
                kind: EdgeKind::Division,
                source: Vertex::new(1, 4),
                target: Vertex::new(2, 5),
            },
        };
        assert_eq!(op.to_string(), "EA: [T=4 Label=1] -> [T=5 Label=2] (Division)");
        assert_eq!(op.category().title(), "Edges to be added (EA)");
    }

    #[test]
    fn test_duplicate_frame_rejected() {
        let g = graph("1 0 0 0\n");
        let f = frames(&[&[1]]);
        let mut cs = correspondences(&f, &f);
        cs.push(cs[0].clone());

        let r = compute_aogm(&g, &g, &cs, &PenaltyConfig::default(), false, &NoOpReporter);
        assert!(matches!(r, Err(Error::InvalidConfig(_))));
    }

    // ===== Test TRA Evaluation =====

    #[test]
    fn test_strict_mode_rejects_inconsistent_lineage() {
        let gt_g = graph("1 0 1 0\n");
        // RES lineage claims track 5, frames show label 4
        let res_g = graph("5 0 1 0\n");
        let gt_f = frames(&[&[1], &[1]]);
        let res_f = frames(&[&[4], &[4]]);
        let cs = correspondences(&gt_f, &res_f);
        let refs: Vec<&Correspondence> = cs.iter().collect();

        let strict = TraConfig {
            consistency: ConsistencyMode::Strict,
            ..TraConfig::default()
        };
        match evaluate_tra(&gt_g, &res_g, &refs, &strict, &NoOpReporter) {
            Err(Error::GraphUnavailable { series, discrepancies }) => {
                assert_eq!(series, "RES");
                assert_eq!(discrepancies, 2);
            }
            other => panic!("expected GraphUnavailable, got {:?}", other),
        }

        let lenient = evaluate_tra(&gt_g, &res_g, &refs, &TraConfig::default(), &NoOpReporter).unwrap();
        assert!(!lenient.res_consistency.as_ref().unwrap().is_consistent());
        assert!(lenient.gt_consistency.as_ref().unwrap().is_consistent());
        assert!(lenient.value().unwrap() < 1.0);

        let off = TraConfig {
            consistency: ConsistencyMode::Off,
            ..TraConfig::default()
        };
        assert!(evaluate_tra(&gt_g, &res_g, &refs, &off, &NoOpReporter).unwrap().res_consistency.is_none());
    }

    #[test]
    fn test_aogm_mode_value() {
        let gt_g = graph("1 0 1 0\n");
        let gt_f = frames(&[&[1], &[1]]);
        let res_f = frames(&[&[1], &[]]);
        let res_g = graph("1 0 0 0\n");
        let cs = correspondences(&gt_f, &res_f);
        let refs: Vec<&Correspondence> = cs.iter().collect();

        let r = evaluate_tra(&gt_g, &res_g, &refs, &TraConfig::aogm(), &NoOpReporter).unwrap();
        // one missed vertex and its incoming edge
        assert_relative_eq!(r.value().unwrap(), 10.0 + 1.5);

        let r = evaluate_tra(&gt_g, &res_g, &refs, &TraConfig::default(), &NoOpReporter).unwrap();
        assert_relative_eq!(r.value().unwrap(), 1.0 - 11.5 / 21.5);
    }

    #[test]
    fn test_tra_undefined_for_empty_gt() {
        let empty = frames(&[&[]]);
        let cs = correspondences(&empty, &empty);
        let refs: Vec<&Correspondence> = cs.iter().collect();
        let g = LineageGraph::default();
        let r = evaluate_tra(&g, &g, &refs, &TraConfig::default(), &NoOpReporter).unwrap();
        assert!(matches!(r.value(), Err(Error::UndefinedMeasure(_))));
    }
}
