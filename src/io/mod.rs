//! Reading labelled frames and lineages from storage.
//!
//! - [`DatasetLayout`] - Cell Tracking Challenge folder and file naming
//! - [`FrameReader`] - source of frames and track tables
//! - [`DirectoryReader`] - TIFF files on disk
//! - [`MemoryReader`] - frames held in memory

mod layout;
mod reader;

pub use layout::{
    parse_res_file_name, parse_seg_file_name, parse_tra_file_name, DatasetLayout, FrameIndex,
};
pub use reader::{decode_label_image, DirectoryReader, FrameReader, MemoryReader, Series};
