//! Labelled frames (2D images or 3D volumes of object labels).

use std::collections::BTreeSet;
use crate::{Error, Result};

/// An object label. `0` is background.
pub type Label = u32;

/// Background label value.
pub const BACKGROUND: Label = 0;

/// An N-dimensional array of labels.
///
/// Voxels are stored in a flat buffer with axis 0 varying fastest
/// (x, then y, then z), which is also how TIFF planes are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFrame {
    shape: Vec<usize>,
    data: Vec<Label>,
}

impl LabeledFrame {
    /// Create a frame from its shape and voxel buffer.
    ///
    /// # Arguments
    /// * `shape` - Extent along every axis, axis 0 first
    /// * `data` - Voxel labels, axis 0 varying fastest
    pub fn new(shape: Vec<usize>, data: Vec<Label>) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::DecodeError("frame must have at least one axis".to_string()));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::DecodeError(format!(
                "frame of shape {:?} needs {} voxels, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Create a background-only frame.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![BACKGROUND; len],
        }
    }

    /// Create a 2D frame from rows given top to bottom.
    ///
    /// Convenient for small hand-written frames.
    pub fn from_rows(rows: &[&[Label]]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return Err(Error::DecodeError("rows have different lengths".to_string()));
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(vec![width, height], data)
    }

    /// Extent along every axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the frame holds no voxels at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat voxel buffer.
    pub fn voxels(&self) -> &[Label] {
        &self.data
    }

    /// Mutable flat voxel buffer.
    pub fn voxels_mut(&mut self) -> &mut [Label] {
        &mut self.data
    }

    /// Label at the given coordinates, or None when out of bounds.
    pub fn get(&self, coords: &[usize]) -> Option<Label> {
        self.offset(coords).map(|i| self.data[i])
    }

    /// Set the label at the given coordinates. Returns false when out of bounds.
    pub fn set(&mut self, coords: &[usize], label: Label) -> bool {
        match self.offset(coords) {
            Some(i) => {
                self.data[i] = label;
                true
            }
            None => false,
        }
    }

    fn offset(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (&c, &extent) in coords.iter().zip(&self.shape) {
            if c >= extent {
                return None;
            }
            offset += c * stride;
            stride *= extent;
        }
        Some(offset)
    }

    /// Distinct non-background labels present in the frame.
    pub fn labels(&self) -> BTreeSet<Label> {
        self.data.iter().copied().filter(|&l| l != BACKGROUND).collect()
    }

    /// Extract the plane `z = slice` of a volume as a 2D frame.
    ///
    /// Requires at least three axes; axes beyond the third are not supported.
    pub fn hyper_slice(&self, frame: usize, slice: usize) -> Result<LabeledFrame> {
        let depth = self.shape.get(2).copied().unwrap_or(0);
        if self.ndim() != 3 || slice >= depth {
            return Err(Error::InvalidSliceRequest {
                frame,
                slice,
                ndim: self.ndim(),
                depth,
            });
        }
        let plane = self.shape[0] * self.shape[1];
        let start = plane * slice;
        Ok(LabeledFrame {
            shape: vec![self.shape[0], self.shape[1]],
            data: self.data[start..start + plane].to_vec(),
        })
    }
}
