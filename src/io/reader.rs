//! Frame readers: where labelled frames and track tables come from.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

use super::layout::{parse_res_file_name, parse_seg_file_name, parse_tra_file_name, DatasetLayout, FrameIndex};
use crate::frame::{Label, LabeledFrame};
use crate::lineage::TrackTable;
use crate::{Error, Result};

/// A sequence of labelled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Series {
    /// Ground-truth segmentation annotations
    SegGroundTruth,
    /// Ground-truth tracking markers with their lineage
    TraGroundTruth,
    /// Result masks with their lineage
    Result,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegGroundTruth => write!(f, "GT/SEG"),
            Self::TraGroundTruth => write!(f, "GT/TRA"),
            Self::Result => write!(f, "RES"),
        }
    }
}

/// Source of labelled frames and track tables.
///
/// Result frames are always read whole; slices are taken by the caller.
pub trait FrameReader: Send + Sync {
    /// Read one frame of a series.
    fn read(&self, series: Series, index: FrameIndex) -> Result<LabeledFrame>;

    /// Available frames of a series, ascending.
    fn frames(&self, series: Series) -> Result<Vec<FrameIndex>>;

    /// Lineage of a tracking series.
    fn track_table(&self, series: Series) -> Result<TrackTable>;

    /// Identity of a series, used to key cached correspondences.
    fn identity(&self, series: Series) -> String {
        series.to_string()
    }
}

fn no_lineage(series: Series) -> Error {
    Error::InvalidConfig(format!("series {} has no lineage", series))
}

/// Reads TIFF files from a Cell Tracking Challenge folder pair.
///
/// Each file holds 8- or 16-bit labels: one page for a 2D frame, one page
/// per slice for a volume.
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    layout: DatasetLayout,
}

impl DirectoryReader {
    pub fn new(layout: DatasetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    fn dir(&self, series: Series) -> PathBuf {
        match series {
            Series::SegGroundTruth => self.layout.seg_dir(),
            Series::TraGroundTruth => self.layout.tra_dir(),
            Series::Result => self.layout.res_dir().to_path_buf(),
        }
    }

    /// Frame files of a series, sorted by frame and then by path.
    fn entries(&self, series: Series) -> Result<Vec<(FrameIndex, PathBuf)>> {
        let dir = self.dir(series);
        let entries = fs::read_dir(&dir).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to list '{}': {}", dir.display(), e),
            ))
        })?;

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let index = match series {
                Series::SegGroundTruth => parse_seg_file_name(name)?,
                Series::TraGroundTruth => parse_tra_file_name(name)?.map(FrameIndex::new),
                Series::Result => parse_res_file_name(name)?.map(FrameIndex::new),
            };
            if let Some(index) = index {
                frames.push((index, entry.path()));
            }
        }
        frames.sort();
        Ok(frames)
    }
}

/// Decode a label image.
///
/// TIFF files are read page by page; several pages of equal size stack into
/// a `[width, height, pages]` volume. Other formats hold a single plane.
pub fn decode_label_image(path: &Path) -> Result<LabeledFrame> {
    let is_tiff = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"));
    if is_tiff {
        decode_tiff_stack(path)
    } else {
        decode_plane(path)
    }
}

fn decode_error(path: &Path, e: impl fmt::Display) -> Error {
    Error::DecodeError(format!("{}: {}", path.display(), e))
}

fn decode_tiff_stack(path: &Path) -> Result<LabeledFrame> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| decode_error(path, e))?;

    let mut plane = None;
    let mut pages = 0;
    let mut data: Vec<Label> = Vec::new();
    loop {
        let dims = decoder.dimensions().map_err(|e| decode_error(path, e))?;
        let first = *plane.get_or_insert(dims);
        if first != dims {
            return Err(decode_error(
                path,
                format!("page {} is {:?}, page 0 is {:?}", pages, dims, first),
            ));
        }

        let color = decoder.colortype().map_err(|e| decode_error(path, e))?;
        match (color, decoder.read_image().map_err(|e| decode_error(path, e))?) {
            (ColorType::Gray(8), DecodingResult::U8(buf)) => data.extend(buf.into_iter().map(Label::from)),
            (ColorType::Gray(16), DecodingResult::U16(buf)) => data.extend(buf.into_iter().map(Label::from)),
            (color, _) => {
                return Err(decode_error(
                    path,
                    format!(
                        "unsupported pixel type {:?} on page {}, expected 8- or 16-bit grayscale labels",
                        color, pages
                    ),
                ))
            }
        }
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|e| decode_error(path, e))?;
    }

    let (width, height) = plane.unwrap_or((0, 0));
    let mut shape = vec![width as usize, height as usize];
    if pages > 1 {
        shape.push(pages);
    }
    LabeledFrame::new(shape, data)
}

fn decode_plane(path: &Path) -> Result<LabeledFrame> {
    let image = ImageReader::open(path)?
        .decode()
        .map_err(|e| decode_error(path, e))?;

    let (width, height, data): (u32, u32, Vec<Label>) = match image {
        DynamicImage::ImageLuma8(buf) => (
            buf.width(),
            buf.height(),
            buf.into_raw().into_iter().map(Label::from).collect(),
        ),
        DynamicImage::ImageLuma16(buf) => (
            buf.width(),
            buf.height(),
            buf.into_raw().into_iter().map(Label::from).collect(),
        ),
        other => {
            return Err(decode_error(
                path,
                format!(
                    "unsupported pixel type {:?}, expected 8- or 16-bit grayscale labels",
                    other.color()
                ),
            ))
        }
    };
    LabeledFrame::new(vec![width as usize, height as usize], data)
}

impl FrameReader for DirectoryReader {
    fn read(&self, series: Series, index: FrameIndex) -> Result<LabeledFrame> {
        let candidates = match series {
            Series::SegGroundTruth => self.layout.seg_paths(index),
            Series::TraGroundTruth => vec![self.layout.tra_path(index.time)],
            Series::Result => vec![self.layout.res_path(index.time)],
        };
        if let Some(path) = candidates.into_iter().find(|p| p.is_file()) {
            return decode_label_image(&path);
        }

        // other digit widths, `.tiff`
        let listed = match self.entries(series) {
            Ok(listed) => listed,
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        let path = listed
            .into_iter()
            .find(|(i, _)| *i == index)
            .map(|(_, path)| path)
            .ok_or_else(|| Error::FrameNotFound {
                series: series.to_string(),
                frame: index.time,
            })?;
        decode_label_image(&path)
    }

    fn frames(&self, series: Series) -> Result<Vec<FrameIndex>> {
        let mut frames: Vec<FrameIndex> = self.entries(series)?.into_iter().map(|(i, _)| i).collect();
        frames.dedup();
        Ok(frames)
    }

    fn track_table(&self, series: Series) -> Result<TrackTable> {
        match series {
            Series::TraGroundTruth => TrackTable::from_file(self.layout.gt_track_table()),
            Series::Result => TrackTable::from_file(self.layout.res_track_table()),
            Series::SegGroundTruth => Err(no_lineage(series)),
        }
    }

    fn identity(&self, series: Series) -> String {
        match series {
            Series::SegGroundTruth => self.layout.seg_dir().display().to_string(),
            Series::TraGroundTruth => self.layout.tra_dir().display().to_string(),
            Series::Result => self.layout.res.display().to_string(),
        }
    }
}

/// Frames and track tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    frames: HashMap<Series, BTreeMap<FrameIndex, LabeledFrame>>,
    tables: HashMap<Series, TrackTable>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, replacing any previous one at the same index.
    pub fn insert(&mut self, series: Series, index: FrameIndex, frame: LabeledFrame) {
        self.frames.entry(series).or_default().insert(index, frame);
    }

    pub fn with_frame(mut self, series: Series, index: FrameIndex, frame: LabeledFrame) -> Self {
        self.insert(series, index, frame);
        self
    }

    pub fn set_track_table(&mut self, series: Series, table: TrackTable) {
        self.tables.insert(series, table);
    }

    pub fn with_track_table(mut self, series: Series, table: TrackTable) -> Self {
        self.set_track_table(series, table);
        self
    }
}

impl FrameReader for MemoryReader {
    fn read(&self, series: Series, index: FrameIndex) -> Result<LabeledFrame> {
        self.frames
            .get(&series)
            .and_then(|f| f.get(&index))
            .cloned()
            .ok_or_else(|| Error::FrameNotFound {
                series: series.to_string(),
                frame: index.time,
            })
    }

    fn frames(&self, series: Series) -> Result<Vec<FrameIndex>> {
        Ok(self
            .frames
            .get(&series)
            .map(|f| f.keys().copied().collect())
            .unwrap_or_default())
    }

    fn track_table(&self, series: Series) -> Result<TrackTable> {
        self.tables.get(&series).cloned().ok_or_else(|| no_lineage(series))
    }
}
