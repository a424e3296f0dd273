//! Lineage of tracked objects.
//!
//! - `TrackTable` - Read and write `id begin end parent` track tables
//! - `LineageGraph` - Validated graph of tracks with temporal and division edges
//! - `check_consistency` - Compare declared tracks with the labels in each frame

mod consistency;
mod graph;
mod track_table;

pub use consistency::{check_consistency, ConsistencyMode, ConsistencyReport, FrameDiscrepancy};
pub use graph::{Edge, EdgeKind, LineageGraph, Vertex};
pub use track_table::{TrackRecord, TrackTable};
