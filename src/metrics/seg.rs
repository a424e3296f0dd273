//! SEG: mean Jaccard index over all ground-truth objects.

use serde::{Deserialize, Serialize};

use super::SegConfig;
use crate::correspondence::Correspondence;
use crate::reporter::Reporter;
use crate::{Error, Result};

/// Outcome of the SEG measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegResult {
    /// Mean Jaccard index over all GT objects of all frames
    pub seg: f64,
    /// Number of GT objects (terms of the mean)
    pub terms: usize,
    /// Number of GT objects with a RES match
    pub matched: usize,
    /// Number of annotated frames (or slices)
    pub frames: usize,
}

/// Compute SEG from per-frame correspondences.
///
/// Every GT label of every frame contributes one term: its Jaccard index
/// against the matched RES label, or 0 when unmatched.
///
/// # Arguments
/// * `frames` - (slice, correspondence) per annotated frame, in frame order
/// * `config` - SEG options
/// * `reporter` - Receives per-object Jaccard values when verbose
///
/// # Returns
/// `UndefinedMeasure` when there is no GT object at all.
pub fn score_seg<'a, I>(frames: I, config: &SegConfig, reporter: &dyn Reporter) -> Result<SegResult>
where
    I: IntoIterator<Item = (Option<usize>, &'a Correspondence)>,
{
    let mut sum = 0.0;
    let mut terms = 0;
    let mut matched = 0;
    let mut frame_count = 0;

    for (slice, c) in frames {
        frame_count += 1;
        if config.verbose {
            reporter.on_correspondence(slice, c);
        }

        for &gt in c.gt_labels() {
            let jaccard = c.jaccard(gt);
            if c.matched_res(gt).is_some() {
                matched += 1;
            }
            sum += jaccard;
            terms += 1;

            if config.verbose {
                reporter.on_jaccard(c.frame(), slice, gt, jaccard);
            }
        }
    }

    if terms == 0 {
        return Err(Error::UndefinedMeasure(
            "SEG: no ground-truth objects in any annotated frame".to_string(),
        ));
    }

    let seg = sum / terms as f64;
    reporter.on_measure("SEG", seg);
    Ok(SegResult {
        seg,
        terms,
        matched,
        frames: frame_count,
    })
}
