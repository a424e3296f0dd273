//! Voxel histograms and GT/RES intersection counts.

use std::collections::{BTreeMap, HashMap};
use crate::frame::{Label, LabeledFrame, BACKGROUND};
use crate::{Error, Result};

/// Voxel count per non-background label of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelHistogram {
    counts: BTreeMap<Label, u64>,
}

impl VoxelHistogram {
    /// Build the histogram with one scan of the frame.
    pub fn from_frame(frame: &LabeledFrame) -> Self {
        let mut hist = Self::default();
        for &label in frame.voxels() {
            hist.add(label);
        }
        hist
    }

    fn add(&mut self, label: Label) {
        if label != BACKGROUND {
            *self.counts.entry(label).or_insert(0) += 1;
        }
    }

    /// Voxel count of a label (0 if absent).
    pub fn count(&self, label: Label) -> u64 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.counts.keys().copied()
    }

    /// (label, count) pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, u64)> + '_ {
        self.counts.iter().map(|(&l, &c)| (l, c))
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Sparse shared-voxel counts for (GT label, RES label) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectionMatrix {
    counts: HashMap<(Label, Label), u64>,
}

impl IntersectionMatrix {
    /// Shared voxel count of a pair (0 if they do not touch).
    pub fn get(&self, gt: Label, res: Label) -> u64 {
        self.counts.get(&(gt, res)).copied().unwrap_or(0)
    }

    /// All non-zero pairs, unordered.
    pub fn iter(&self) -> impl Iterator<Item = ((Label, Label), u64)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }

    /// Number of non-zero pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Result of one joint scan over a GT/RES frame pair.
#[derive(Debug, Clone, Default)]
pub struct JointHistogram {
    pub gt: VoxelHistogram,
    pub res: VoxelHistogram,
    pub intersections: IntersectionMatrix,
}

impl JointHistogram {
    /// Scan both frames once, counting marginals and intersections together.
    ///
    /// Fails with `ShapeMismatch` when the frames differ in dimensionality or
    /// in any extent.
    pub fn scan(frame: usize, gt: &LabeledFrame, res: &LabeledFrame) -> Result<Self> {
        if gt.shape() != res.shape() {
            return Err(Error::ShapeMismatch {
                frame,
                gt: gt.shape().to_vec(),
                res: res.shape().to_vec(),
            });
        }

        let mut joint = Self::default();
        for (&g, &r) in gt.voxels().iter().zip(res.voxels()) {
            joint.gt.add(g);
            joint.res.add(r);
            if g != BACKGROUND && r != BACKGROUND {
                *joint.intersections.counts.entry((g, r)).or_insert(0) += 1;
            }
        }
        Ok(joint)
    }
}
