//! Per-frame label correspondence between ground truth and result.
//!
//! One joint scan of a GT/RES frame pair yields voxel histograms and
//! intersection counts, from which the majority-overlap matching is derived.
//! The resulting [`Correspondence`] is immutable and shared between the SEG
//! and TRA measures through the [`CorrespondenceCache`].

mod cache;
mod histogram;

pub use cache::{CorrespondenceCache, FrameKey};
pub use histogram::{IntersectionMatrix, JointHistogram, VoxelHistogram};

use nalgebra::DMatrix;
use crate::frame::{Label, LabeledFrame};
use crate::matching::{majority_overlap_matches, matches_per_column, validate_overlaps};
use crate::Result;

/// Label matching of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondence {
    frame: usize,
    /// GT labels, ascending
    gt_labels: Vec<Label>,
    /// RES labels, ascending
    res_labels: Vec<Label>,
    gt_sizes: Vec<u64>,
    res_sizes: Vec<u64>,
    /// Non-zero (GT index, shared voxels) per RES index, GT index ascending
    res_overlaps: Vec<Vec<(usize, u64)>>,
    /// Matched RES index and shared voxels for every GT index
    gt_match: Vec<Option<(usize, u64)>>,
    /// GT indices matched to every RES index
    res_match: Vec<Vec<usize>>,
}

impl Correspondence {
    /// Compute the correspondence of a GT/RES frame pair.
    ///
    /// # Arguments
    /// * `frame` - Frame index, used in error messages
    /// * `gt` - Ground-truth frame
    /// * `res` - Result frame, same shape as `gt`
    pub fn compute(frame: usize, gt: &LabeledFrame, res: &LabeledFrame) -> Result<Self> {
        let joint = JointHistogram::scan(frame, gt, res)?;
        Ok(Self::from_histograms(frame, &joint))
    }

    /// Derive the matching from an already computed joint histogram.
    pub fn from_histograms(frame: usize, joint: &JointHistogram) -> Self {
        let (gt_labels, gt_sizes): (Vec<_>, Vec<_>) = joint.gt.iter().unzip();
        let (res_labels, res_sizes): (Vec<_>, Vec<_>) = joint.res.iter().unzip();

        let mut overlaps = DMatrix::zeros(gt_labels.len(), res_labels.len());
        for ((g, r), count) in joint.intersections.iter() {
            // both label lists are sorted, and every intersecting label is present
            if let (Ok(i), Ok(j)) = (gt_labels.binary_search(&g), res_labels.binary_search(&r)) {
                overlaps[(i, j)] = count;
            }
        }

        Self::from_parts(frame, gt_labels, gt_sizes, res_labels, res_sizes, &overlaps)
    }

    /// Match on the dense table, then keep only its non-zero entries.
    fn from_parts(
        frame: usize,
        gt_labels: Vec<Label>,
        gt_sizes: Vec<u64>,
        res_labels: Vec<Label>,
        res_sizes: Vec<u64>,
        overlaps: &DMatrix<u64>,
    ) -> Self {
        let matches = majority_overlap_matches(overlaps, &gt_sizes);
        let res_match = matches_per_column(&matches, res_labels.len());
        let gt_match = matches
            .iter()
            .enumerate()
            .map(|(i, m)| m.map(|j| (j, overlaps[(i, j)])))
            .collect();
        let res_overlaps = overlaps
            .column_iter()
            .map(|col| {
                col.iter()
                    .enumerate()
                    .filter(|(_, &count)| count > 0)
                    .map(|(i, &count)| (i, count))
                    .collect()
            })
            .collect();

        Self {
            frame,
            gt_labels,
            res_labels,
            gt_sizes,
            res_sizes,
            res_overlaps,
            gt_match,
            res_match,
        }
    }

    /// Build a correspondence from label sizes and a dense overlap table.
    ///
    /// Labels must be given in ascending order with their sizes; the table
    /// rows follow `gt`, its columns follow `res`.
    pub fn from_overlaps(
        frame: usize,
        gt: &[(Label, u64)],
        res: &[(Label, u64)],
        overlaps: DMatrix<u64>,
    ) -> Result<Self> {
        let (gt_labels, gt_sizes): (Vec<_>, Vec<_>) = gt.iter().copied().unzip();
        let (res_labels, res_sizes): (Vec<_>, Vec<_>) = res.iter().copied().unzip();
        validate_overlaps(&overlaps, &gt_sizes)?;
        if overlaps.ncols() != res_labels.len() {
            return Err(crate::Error::InvalidConfig(format!(
                "overlap table has {} columns but {} RES labels were given",
                overlaps.ncols(),
                res_labels.len()
            )));
        }
        if !gt_labels.windows(2).all(|w| w[0] < w[1]) || !res_labels.windows(2).all(|w| w[0] < w[1]) {
            return Err(crate::Error::InvalidConfig(
                "labels must be strictly ascending".to_string(),
            ));
        }

        Ok(Self::from_parts(frame, gt_labels, gt_sizes, res_labels, res_sizes, &overlaps))
    }

    /// Frame index this correspondence belongs to.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// GT labels present in the frame, ascending.
    pub fn gt_labels(&self) -> &[Label] {
        &self.gt_labels
    }

    /// RES labels present in the frame, ascending.
    pub fn res_labels(&self) -> &[Label] {
        &self.res_labels
    }

    /// True if neither frame contains any object.
    pub fn is_empty(&self) -> bool {
        self.gt_labels.is_empty() && self.res_labels.is_empty()
    }

    fn gt_index(&self, label: Label) -> Option<usize> {
        self.gt_labels.binary_search(&label).ok()
    }

    fn res_index(&self, label: Label) -> Option<usize> {
        self.res_labels.binary_search(&label).ok()
    }

    /// Voxel count of a GT label (0 if absent).
    pub fn gt_size(&self, label: Label) -> u64 {
        self.gt_index(label).map(|i| self.gt_sizes[i]).unwrap_or(0)
    }

    /// Voxel count of a RES label (0 if absent).
    pub fn res_size(&self, label: Label) -> u64 {
        self.res_index(label).map(|j| self.res_sizes[j]).unwrap_or(0)
    }

    /// Shared voxel count of a GT/RES pair.
    pub fn intersection(&self, gt: Label, res: Label) -> u64 {
        match (self.gt_index(gt), self.res_index(res)) {
            (Some(i), Some(j)) => {
                let row = &self.res_overlaps[j];
                row.binary_search_by_key(&i, |&(g, _)| g)
                    .map(|k| row[k].1)
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// RES label matched to a GT label, if any.
    pub fn matched_res(&self, gt: Label) -> Option<Label> {
        self.gt_index(gt)
            .and_then(|i| self.gt_match[i])
            .map(|(j, _)| self.res_labels[j])
    }

    /// GT labels matched to a RES label (several for an under-segmentation).
    pub fn matched_gt(&self, res: Label) -> Vec<Label> {
        self.res_index(res)
            .map(|j| self.res_match[j].iter().map(|&i| self.gt_labels[i]).collect())
            .unwrap_or_default()
    }

    /// GT labels overlapping a RES label with their shared voxel counts,
    /// matched or not.
    pub fn overlapping_gt(&self, res: Label) -> Vec<(Label, u64)> {
        match self.res_index(res) {
            Some(j) => self.res_overlaps[j]
                .iter()
                .map(|&(i, count)| (self.gt_labels[i], count))
                .collect(),
            None => Vec::new(),
        }
    }

    /// GT labels without a RES match.
    pub fn unmatched_gt(&self) -> impl Iterator<Item = Label> + '_ {
        self.gt_labels
            .iter()
            .zip(&self.gt_match)
            .filter(|(_, m)| m.is_none())
            .map(|(&g, _)| g)
    }

    /// RES labels not matched by any GT label.
    pub fn unmatched_res(&self) -> impl Iterator<Item = Label> + '_ {
        self.res_labels
            .iter()
            .zip(&self.res_match)
            .filter(|(_, m)| m.is_empty())
            .map(|(&r, _)| r)
    }

    /// RES labels matched by more than one GT label, with those GT labels.
    pub fn split_res(&self) -> impl Iterator<Item = (Label, Vec<Label>)> + '_ {
        self.res_labels
            .iter()
            .zip(&self.res_match)
            .filter(|(_, m)| m.len() > 1)
            .map(|(&r, m)| (r, m.iter().map(|&i| self.gt_labels[i]).collect()))
    }

    /// Jaccard index of a GT label against its matched RES label.
    ///
    /// Returns 0 for unmatched or absent labels.
    pub fn jaccard(&self, gt: Label) -> f64 {
        let Some(i) = self.gt_index(gt) else {
            return 0.0;
        };
        match self.gt_match[i] {
            Some((j, shared)) => {
                let shared = shared as f64;
                shared / (self.gt_sizes[i] as f64 + self.res_sizes[j] as f64 - shared)
            }
            None => 0.0,
        }
    }

    /// Fraction of the GT label covered by its best RES match, or 0 if unmatched.
    pub fn overlap_fraction(&self, gt: Label) -> f64 {
        match self.gt_index(gt).and_then(|i| self.gt_match[i].map(|(_, shared)| (i, shared))) {
            Some((i, shared)) => shared as f64 / self.gt_sizes[i] as f64,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario_frames() -> (LabeledFrame, LabeledFrame) {
        // GT 1 has 100 voxels, GT 2 has 50; RES 1 covers all of GT 1 and 40
        // voxels of GT 2 (140 voxels in total).
        let mut gt = vec![0; 200];
        let mut res = vec![0; 200];
        for v in gt.iter_mut().take(100) {
            *v = 1;
        }
        for v in gt.iter_mut().skip(100).take(50) {
            *v = 2;
        }
        for v in res.iter_mut().take(140) {
            *v = 1;
        }
        (
            LabeledFrame::new(vec![20, 10], gt).unwrap(),
            LabeledFrame::new(vec![20, 10], res).unwrap(),
        )
    }

    #[test]
    fn test_split_scenario() {
        let (gt, res) = scenario_frames();
        let c = Correspondence::compute(0, &gt, &res).unwrap();

        assert_eq!(c.gt_labels(), &[1, 2]);
        assert_eq!(c.res_labels(), &[1]);
        assert_eq!(c.matched_res(1), Some(1));
        assert_eq!(c.matched_res(2), Some(1));
        assert_eq!(c.matched_gt(1), vec![1, 2]);
        assert_eq!(c.split_res().count(), 1);

        assert_relative_eq!(c.jaccard(1), 100.0 / 140.0);
        assert_relative_eq!(c.jaccard(2), 40.0 / 150.0);
        assert_relative_eq!(c.overlap_fraction(2), 0.8);
    }

    #[test]
    fn test_reverse_lookup_includes_unmatched_overlaps() {
        let gt = LabeledFrame::from_rows(&[&[1, 1, 1, 1], &[2, 2, 2, 2]]).unwrap();
        let res = LabeledFrame::from_rows(&[&[3, 3, 3, 0], &[3, 0, 0, 0]]).unwrap();
        let c = Correspondence::compute(4, &gt, &res).unwrap();

        assert_eq!(c.frame(), 4);
        assert_eq!(c.matched_res(1), Some(3));
        assert_eq!(c.matched_res(2), None);
        assert_eq!(c.overlapping_gt(3), vec![(1, 3), (2, 1)]);
        assert_eq!(c.unmatched_gt().collect::<Vec<_>>(), vec![2]);
        assert_eq!(c.unmatched_res().count(), 0);
    }

    #[test]
    fn test_false_positive_label() {
        let gt = LabeledFrame::from_rows(&[&[1, 1, 0, 0]]).unwrap();
        let res = LabeledFrame::from_rows(&[&[1, 1, 0, 9]]).unwrap();
        let c = Correspondence::compute(0, &gt, &res).unwrap();
        assert_eq!(c.unmatched_res().collect::<Vec<_>>(), vec![9]);
        assert_relative_eq!(c.jaccard(1), 1.0);
        assert_eq!(c.res_size(9), 1);
        assert_eq!(c.gt_size(9), 0);
    }

    #[test]
    fn test_empty_frames() {
        let gt = LabeledFrame::zeros(vec![5, 5]);
        let res = LabeledFrame::zeros(vec![5, 5]);
        let c = Correspondence::compute(0, &gt, &res).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.jaccard(1), 0.0);
        assert!(c.matched_gt(1).is_empty());
    }

    #[test]
    fn test_from_overlaps_matches_compute() {
        let (gt, res) = scenario_frames();
        let computed = Correspondence::compute(0, &gt, &res).unwrap();
        let built = Correspondence::from_overlaps(
            0,
            &[(1, 100), (2, 50)],
            &[(1, 140)],
            DMatrix::from_row_slice(2, 1, &[100, 40]),
        )
        .unwrap();
        assert_eq!(computed, built);
    }

    #[test]
    fn test_from_overlaps_rejects_bad_tables() {
        let too_large = Correspondence::from_overlaps(
            0,
            &[(1, 10)],
            &[(1, 10)],
            DMatrix::from_row_slice(1, 1, &[11]),
        );
        assert!(too_large.is_err());

        let unsorted = Correspondence::from_overlaps(
            0,
            &[(2, 10), (1, 10)],
            &[],
            DMatrix::zeros(2, 0),
        );
        assert!(unsorted.is_err());
    }

    #[test]
    fn test_only_overlapping_pairs_are_kept() {
        // 50 GT and 50 RES labels on the diagonal: 50 overlaps, not 2500
        let gt = LabeledFrame::new(vec![50], (1..=50).collect()).unwrap();
        let res = LabeledFrame::new(vec![50], (101..=150).collect()).unwrap();
        let c = Correspondence::compute(0, &gt, &res).unwrap();

        let stored: usize = c.res_overlaps.iter().map(|o| o.len()).sum();
        assert_eq!(stored, 50);
        assert_eq!(c.matched_res(7), Some(107));
        assert_eq!(c.intersection(7, 107), 1);
        assert_eq!(c.intersection(7, 108), 0);
        assert_eq!(c.overlapping_gt(150), vec![(50, 1)]);
    }

    #[test]
    fn test_majority_rule_holds_for_every_match() {
        let gt = LabeledFrame::from_rows(&[
            &[1, 1, 2, 2, 3],
            &[1, 1, 2, 2, 3],
            &[4, 4, 4, 0, 3],
        ])
        .unwrap();
        let res = LabeledFrame::from_rows(&[
            &[7, 7, 7, 8, 8],
            &[7, 0, 8, 8, 8],
            &[9, 9, 0, 0, 0],
        ])
        .unwrap();
        let c = Correspondence::compute(0, &gt, &res).unwrap();
        for &g in c.gt_labels() {
            if let Some(r) = c.matched_res(g) {
                assert!(2 * c.intersection(g, r) > c.gt_size(g));
            }
        }
    }
}
