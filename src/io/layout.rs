//! Cell Tracking Challenge folder layout and file naming.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SEG_PREFIX: &str = "man_seg";
const TRA_PREFIX: &str = "man_track";
const RES_PREFIX: &str = "mask";

/// Position of an annotated frame: time point and, for a 2D annotation of a
/// volumetric frame, the annotated slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameIndex {
    pub time: usize,
    pub slice: Option<usize>,
}

impl FrameIndex {
    /// Full frame at a time point.
    pub fn new(time: usize) -> Self {
        Self { time, slice: None }
    }

    /// One slice of the frame at a time point.
    pub fn slice(time: usize, slice: usize) -> Self {
        Self {
            time,
            slice: Some(slice),
        }
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slice {
            Some(z) => write!(f, "T={} Z={}", self.time, z),
            None => write!(f, "T={}", self.time),
        }
    }
}

/// Paths of a GT folder and a RES folder.
///
/// ```text
/// <gt>/SEG/man_seg<T>.tif, man_seg_<T>.tif, man_seg_<T>_<Z>.tif
/// <gt>/TRA/man_track<T>.tif, man_track.txt
/// <res>/mask<T>.tif, res_track.txt
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Ground-truth folder (contains `SEG` and `TRA`)
    pub gt: PathBuf,
    /// Result folder
    pub res: PathBuf,
    /// Zero-padded width of time and slice numbers
    pub digits: usize,
}

impl DatasetLayout {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(gt: P, res: Q) -> Self {
        Self {
            gt: gt.into(),
            res: res.into(),
            digits: 3,
        }
    }

    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub fn seg_dir(&self) -> PathBuf {
        self.gt.join("SEG")
    }

    pub fn tra_dir(&self) -> PathBuf {
        self.gt.join("TRA")
    }

    pub fn res_dir(&self) -> &Path {
        &self.res
    }

    /// Candidate paths of a SEG annotation, in lookup order.
    pub fn seg_paths(&self, index: FrameIndex) -> Vec<PathBuf> {
        let d = self.digits;
        let dir = self.seg_dir();
        match index.slice {
            Some(z) => vec![dir.join(format!("{}_{:0d$}_{:0d$}.tif", SEG_PREFIX, index.time, z, d = d))],
            None => vec![
                dir.join(format!("{}{:0d$}.tif", SEG_PREFIX, index.time, d = d)),
                dir.join(format!("{}_{:0d$}.tif", SEG_PREFIX, index.time, d = d)),
            ],
        }
    }

    pub fn tra_path(&self, time: usize) -> PathBuf {
        self.tra_dir()
            .join(format!("{}{:0d$}.tif", TRA_PREFIX, time, d = self.digits))
    }

    pub fn res_path(&self, time: usize) -> PathBuf {
        self.res
            .join(format!("{}{:0d$}.tif", RES_PREFIX, time, d = self.digits))
    }

    pub fn gt_track_table(&self) -> PathBuf {
        self.tra_dir().join("man_track.txt")
    }

    pub fn res_track_table(&self) -> PathBuf {
        self.res.join("res_track.txt")
    }
}

fn tiff_stem(name: &str) -> Option<&str> {
    name.strip_suffix(".tif").or_else(|| name.strip_suffix(".tiff"))
}

fn parse_number(text: &str, name: &str) -> Result<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::FilenameFormatError(name.to_string()));
    }
    text.parse()
        .map_err(|_| Error::FilenameFormatError(name.to_string()))
}

/// Parse a SEG annotation file name.
///
/// Returns `Ok(None)` for files that are not `man_seg*` TIFF files, and
/// `FilenameFormatError` for `man_seg*` TIFF files without a readable
/// time point.
pub fn parse_seg_file_name(name: &str) -> Result<Option<FrameIndex>> {
    let Some(rest) = tiff_stem(name).and_then(|s| s.strip_prefix(SEG_PREFIX)) else {
        return Ok(None);
    };

    match rest.strip_prefix('_') {
        None => Ok(Some(FrameIndex::new(parse_number(rest, name)?))),
        Some(rest) => match rest.split_once('_') {
            None => Ok(Some(FrameIndex::new(parse_number(rest, name)?))),
            Some((t, z)) => Ok(Some(FrameIndex::slice(
                parse_number(t, name)?,
                parse_number(z, name)?,
            ))),
        },
    }
}

/// Parse the time point of a `<prefix><T>.tif` file name.
fn parse_time_file_name(prefix: &str, name: &str) -> Result<Option<usize>> {
    match tiff_stem(name).and_then(|s| s.strip_prefix(prefix)) {
        Some(rest) => parse_number(rest, name).map(Some),
        None => Ok(None),
    }
}

/// Parse a `man_track<T>.tif` file name.
pub fn parse_tra_file_name(name: &str) -> Result<Option<usize>> {
    parse_time_file_name(TRA_PREFIX, name)
}

/// Parse a `mask<T>.tif` file name.
pub fn parse_res_file_name(name: &str) -> Result<Option<usize>> {
    parse_time_file_name(RES_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Test File Names =====

    #[test]
    fn test_seg_names() {
        assert_eq!(parse_seg_file_name("man_seg007.tif").unwrap(), Some(FrameIndex::new(7)));
        assert_eq!(parse_seg_file_name("man_seg_012.tif").unwrap(), Some(FrameIndex::new(12)));
        assert_eq!(
            parse_seg_file_name("man_seg_003_041.tif").unwrap(),
            Some(FrameIndex::slice(3, 41))
        );
        assert_eq!(parse_seg_file_name("man_seg0001.tiff").unwrap(), Some(FrameIndex::new(1)));
    }

    #[test]
    fn test_unrelated_files_ignored() {
        assert_eq!(parse_seg_file_name("notes.txt").unwrap(), None);
        assert_eq!(parse_seg_file_name("mask000.tif").unwrap(), None);
        assert_eq!(parse_tra_file_name("man_track.txt").unwrap(), None);
        assert_eq!(parse_res_file_name("res_track.txt").unwrap(), None);
    }

    #[test]
    fn test_malformed_names_rejected() {
        for name in ["man_seg.tif", "man_segabc.tif", "man_seg_01x.tif", "man_seg_001_.tif"] {
            assert!(
                matches!(parse_seg_file_name(name), Err(Error::FilenameFormatError(_))),
                "{} should be rejected",
                name
            );
        }
        assert!(parse_tra_file_name("man_track_a.tif").is_err());
    }

    #[test]
    fn test_time_names() {
        assert_eq!(parse_tra_file_name("man_track042.tif").unwrap(), Some(42));
        assert_eq!(parse_res_file_name("mask000.tif").unwrap(), Some(0));
    }

    // ===== Test Paths =====

    #[test]
    fn test_paths() {
        let layout = DatasetLayout::new("gt", "res");
        assert_eq!(layout.tra_path(5), Path::new("gt/TRA/man_track005.tif"));
        assert_eq!(layout.res_path(12), Path::new("res/mask012.tif"));
        assert_eq!(
            layout.seg_paths(FrameIndex::slice(1, 20)),
            vec![PathBuf::from("gt/SEG/man_seg_001_020.tif")]
        );
        assert_eq!(layout.gt_track_table(), Path::new("gt/TRA/man_track.txt"));
        assert_eq!(layout.res_track_table(), Path::new("res/res_track.txt"));

        let wide = layout.with_digits(4);
        assert_eq!(wide.res_path(7), Path::new("res/mask0007.tif"));
        assert_eq!(wide.seg_paths(FrameIndex::new(7))[1], Path::new("gt/SEG/man_seg_0007.tif"));
    }

    #[test]
    fn test_frame_index_order() {
        let mut frames = vec![FrameIndex::slice(1, 3), FrameIndex::new(2), FrameIndex::new(1)];
        frames.sort();
        assert_eq!(
            frames,
            vec![FrameIndex::new(1), FrameIndex::slice(1, 3), FrameIndex::new(2)]
        );
        assert_eq!(FrameIndex::slice(4, 2).to_string(), "T=4 Z=2");
    }
}
