//! Lineage graphs built from track tables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::track_table::{TrackRecord, TrackTable};
use crate::frame::Label;
use crate::{Error, Result};

/// One detection: a track observed in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    pub track: Label,
    pub frame: usize,
}

impl Vertex {
    pub fn new(track: Label, frame: usize) -> Self {
        Self { track, frame }
    }
}

/// Edge semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Same track, consecutive frames
    Temporal,
    /// Parent's last frame to a child's first frame
    Division,
}

/// A directed lineage edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub source: Vertex,
    pub target: Vertex,
}

/// Acyclic lineage graph of one series.
///
/// Tracks are the nodes of the lineage; for edit-distance purposes each
/// track expands into one [`Vertex`] per frame it is alive in.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    tracks: BTreeMap<Label, TrackRecord>,
    children: BTreeMap<Label, Vec<Label>>,
    edges: Vec<Edge>,
    edge_index: HashMap<(Vertex, Vertex), EdgeKind>,
}

impl LineageGraph {
    /// Build and validate a graph from a track table.
    ///
    /// Each row must have `begin <= end`, a parent that is 0 or declared in
    /// an earlier row, and a parent that ends strictly before the child
    /// begins. Track ids must be non-zero and unique.
    pub fn from_table(table: &TrackTable) -> Result<Self> {
        Self::build(table, None)
    }

    /// Like [`from_table`](Self::from_table), and additionally rejects
    /// tracks that end after `last_frame`.
    pub fn from_table_within(table: &TrackTable, last_frame: usize) -> Result<Self> {
        Self::build(table, Some(last_frame))
    }

    fn build(table: &TrackTable, last_frame: Option<usize>) -> Result<Self> {
        let mut graph = Self::default();

        for (idx, record) in table.records().iter().enumerate() {
            let row = idx + 1;
            let malformed = |reason: String| Error::MalformedTrackTable { row, reason };

            if record.id == 0 {
                return Err(malformed("track id 0 is reserved for background".to_string()));
            }
            if graph.tracks.contains_key(&record.id) {
                return Err(malformed(format!("track {} is declared twice", record.id)));
            }
            if record.begin > record.end {
                return Err(malformed(format!(
                    "track {} begins at frame {} after it ends at frame {}",
                    record.id, record.begin, record.end
                )));
            }
            if let Some(last) = last_frame.filter(|&last| record.end > last) {
                return Err(malformed(format!(
                    "track {} ends at frame {}, after the last available frame {}",
                    record.id, record.end, last
                )));
            }
            if record.has_parent() {
                let parent = graph.tracks.get(&record.parent).ok_or_else(|| {
                    malformed(format!(
                        "parent {} of track {} is not declared before it",
                        record.parent, record.id
                    ))
                })?;
                if parent.end >= record.begin {
                    return Err(malformed(format!(
                        "parent {} ends at frame {}, not before track {} begins at frame {}",
                        record.parent, parent.end, record.id, record.begin
                    )));
                }
            }

            graph.add_track(*record);
        }

        Ok(graph)
    }

    fn add_track(&mut self, record: TrackRecord) {
        for frame in record.begin..record.end {
            self.add_edge(Edge {
                kind: EdgeKind::Temporal,
                source: Vertex::new(record.id, frame),
                target: Vertex::new(record.id, frame + 1),
            });
        }

        if record.has_parent() {
            if let Some(parent) = self.tracks.get(&record.parent).copied() {
                self.add_edge(Edge {
                    kind: EdgeKind::Division,
                    source: Vertex::new(parent.id, parent.end),
                    target: Vertex::new(record.id, record.begin),
                });
                self.children.entry(parent.id).or_default().push(record.id);
            }
        }

        self.tracks.insert(record.id, record);
    }

    fn add_edge(&mut self, edge: Edge) {
        self.edge_index.insert((edge.source, edge.target), edge.kind);
        self.edges.push(edge);
    }

    /// Track record by id.
    pub fn track(&self, id: Label) -> Option<&TrackRecord> {
        self.tracks.get(&id)
    }

    /// All tracks in ascending id order.
    pub fn tracks(&self) -> impl Iterator<Item = &TrackRecord> {
        self.tracks.values()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// All edges, temporal and division, in construction order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Kind of the edge from `source` to `target`, if it exists.
    pub fn edge_between(&self, source: Vertex, target: Vertex) -> Option<EdgeKind> {
        self.edge_index.get(&(source, target)).copied()
    }

    /// Number of (track, frame) vertices.
    pub fn vertex_count(&self) -> usize {
        self.tracks.values().map(|t| t.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Children of a track, in declaration order.
    pub fn children(&self, id: Label) -> &[Label] {
        self.children.get(&id).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Tracks that divide into two or more children.
    pub fn divisions(&self) -> impl Iterator<Item = Label> + '_ {
        self.children
            .iter()
            .filter(|(_, c)| c.len() > 1)
            .map(|(&id, _)| id)
    }

    /// Tracks alive in a frame, ascending.
    pub fn alive_at(&self, frame: usize) -> Vec<Label> {
        self.tracks
            .values()
            .filter(|t| t.is_alive_at(frame))
            .map(|t| t.id)
            .collect()
    }

    /// Last frame any track is alive in, or None for an empty graph.
    pub fn last_frame(&self) -> Option<usize> {
        self.tracks.values().map(|t| t.end).max()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Rebuild the track table the graph was built from (ascending id order).
    pub fn to_table(&self) -> TrackTable {
        TrackTable::new(self.tracks.values().copied().collect())
    }
}
