//! Evaluation sessions: run the measures over a dataset.

use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::{evaluate_tra, score_seg, SegConfig, SegResult, TraConfig, TraResult};
use crate::correspondence::{Correspondence, CorrespondenceCache, FrameKey};
use crate::io::{FrameIndex, FrameReader, Series};
use crate::lineage::LineageGraph;
use crate::reporter::Reporter;
use crate::{Error, Result};

/// Results of the requested measures, each evaluated independently.
#[derive(Debug, Default)]
pub struct EvaluationReport {
    pub seg: Option<Result<SegResult>>,
    pub tra: Option<Result<TraResult>>,
}

/// Evaluation session over one GT/RES dataset.
///
/// Correspondences are computed once per (series, frame, slice) and shared by
/// every measure run through the same session.
pub struct Evaluator {
    reader: Arc<dyn FrameReader>,
    reporter: Arc<dyn Reporter>,
    cache: CorrespondenceCache,
}

impl Evaluator {
    pub fn new(reader: Arc<dyn FrameReader>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reader,
            reporter,
            cache: CorrespondenceCache::new(),
        }
    }

    pub fn cache(&self) -> &CorrespondenceCache {
        &self.cache
    }

    /// Drop cached correspondences, e.g. after the frames on disk changed.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Compute the SEG measure over all annotated frames (and slices).
    pub fn seg(&self, config: &SegConfig) -> Result<SegResult> {
        let indices = self.reader.frames(Series::SegGroundTruth)?;
        tracing::info!("SEG: {} annotated frame(s)", indices.len());

        let frames = self.correspondences(Series::SegGroundTruth, &indices)?;
        score_seg(
            frames.iter().map(|(index, c)| (index.slice, c.as_ref())),
            config,
            self.reporter.as_ref(),
        )
    }

    /// Compute the TRA measure (or raw AOGM, per `config.mode`).
    pub fn tra(&self, config: &TraConfig) -> Result<TraResult> {
        let indices: Vec<FrameIndex> = self
            .reader
            .frames(Series::TraGroundTruth)?
            .into_iter()
            .filter(|index| index.slice.is_none())
            .collect();

        let gt_last = indices.last().map(|i| i.time);
        let gt = self.lineage(Series::TraGroundTruth, gt_last)?;
        // a RES track reaching a missing RES frame is reported as FrameCountMismatch
        let res_last = self.reader.frames(Series::Result)?.iter().map(|i| i.time).max();
        let res = self.lineage(Series::Result, res_last.max(gt_last))?;
        tracing::info!(
            "TRA: GT lineage has {} track(s), RES lineage has {} track(s)",
            gt.track_count(),
            res.track_count()
        );

        let frames = self.correspondences(Series::TraGroundTruth, &indices)?;
        let refs: Vec<&Correspondence> = frames.iter().map(|(_, c)| c.as_ref()).collect();

        evaluate_tra(&gt, &res, &refs, config, self.reporter.as_ref())
    }

    /// Run the requested measures; a failure of one does not stop the other.
    pub fn evaluate(&self, seg: Option<&SegConfig>, tra: Option<&TraConfig>) -> EvaluationReport {
        EvaluationReport {
            seg: seg.map(|config| self.seg(config)),
            tra: tra.map(|config| self.tra(config)),
        }
    }

    /// Lineage of a series, with every track ending by its last available frame.
    fn lineage(&self, series: Series, last_frame: Option<usize>) -> Result<LineageGraph> {
        let table = self.reader.track_table(series)?;
        match last_frame {
            Some(last) => LineageGraph::from_table_within(&table, last),
            None if table.is_empty() => Ok(LineageGraph::default()),
            None => Err(Error::MalformedTrackTable {
                row: 1,
                reason: format!("series {} has no frames to hold its tracks", series),
            }),
        }
    }

    /// Correspondences of the given GT frames, in the order given.
    fn correspondences(
        &self,
        gt_series: Series,
        indices: &[FrameIndex],
    ) -> Result<Vec<(FrameIndex, Arc<Correspondence>)>> {
        let gt_id = self.reader.identity(gt_series);
        let res_id = self.reader.identity(Series::Result);
        let hits_before = self.cache.hits();

        let work = |index: &FrameIndex| -> Result<(FrameIndex, Arc<Correspondence>)> {
            let key = FrameKey::new(gt_id.as_str(), res_id.as_str(), index.time).with_slice(index.slice);
            let c = self
                .cache
                .get_or_try_insert_with(&key, || self.compute(gt_series, *index))?;
            Ok((*index, c))
        };

        #[cfg(feature = "rayon")]
        let results: Vec<Result<_>> = indices.par_iter().map(work).collect();

        #[cfg(not(feature = "rayon"))]
        let results: Vec<Result<_>> = indices.iter().map(work).collect();

        // lowest failing frame, not the first to fail
        let frames = results.into_iter().collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            frames = frames.len(),
            cached = self.cache.hits() - hits_before,
            "correspondences ready"
        );
        Ok(frames)
    }

    fn compute(&self, gt_series: Series, index: FrameIndex) -> Result<Correspondence> {
        let gt = self.reader.read(gt_series, index)?;
        let res = match self.reader.read(Series::Result, FrameIndex::new(index.time)) {
            Ok(frame) => frame,
            Err(Error::FrameNotFound { .. }) => {
                return Err(Error::FrameCountMismatch { frame: index.time })
            }
            Err(e) => return Err(e),
        };
        let res = match index.slice {
            Some(z) => res.hyper_slice(index.time, z)?,
            None => res,
        };
        Correspondence::compute(index.time, &gt, &res)
    }
}
