//! Track table (`man_track.txt` / `res_track.txt`) reading and writing.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::frame::Label;
use crate::{Error, Result};

/// One row of a track table.
///
/// The track is alive in frames `begin..=end`; `parent` is 0 for tracks
/// that did not arise from a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: Label,
    pub begin: usize,
    pub end: usize,
    pub parent: Label,
}

impl TrackRecord {
    pub fn new(id: Label, begin: usize, end: usize, parent: Label) -> Self {
        Self { id, begin, end, parent }
    }

    /// True if the track is alive in the frame.
    pub fn is_alive_at(&self, frame: usize) -> bool {
        self.begin <= frame && frame <= self.end
    }

    /// Number of frames the track spans.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) + 1
    }

    pub fn has_parent(&self) -> bool {
        self.parent != 0
    }
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.id, self.begin, self.end, self.parent)
    }
}

/// Ordered rows of a track table.
///
/// Parsing only checks the row syntax; the lineage rules are enforced when a
/// [`LineageGraph`](super::LineageGraph) is built from the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTable {
    records: Vec<TrackRecord>,
}

impl TrackTable {
    pub fn new(records: Vec<TrackRecord>) -> Self {
        Self { records }
    }

    /// Read a track table from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open track file '{}': {}", path.as_ref().display(), e),
            ))
        })?;
        text.parse()
    }

    /// Write the table in its canonical text form.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(&path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create track file '{}': {}", path.as_ref().display(), e),
            ))
        })?;
        let mut writer = BufWriter::new(file);
        write!(writer, "{}", self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn push(&mut self, record: TrackRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromStr for TrackTable {
    type Err = Error;

    /// Parse whitespace-separated `id begin end parent` rows.
    ///
    /// Blank lines are skipped; row numbers in errors are 1-based line numbers.
    fn from_str(text: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let row = idx + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 4 {
                return Err(Error::MalformedTrackTable {
                    row,
                    reason: format!("expected 4 fields, found {}", fields.len()),
                });
            }

            let parse = |name: &str, value: &str| -> Result<u64> {
                value.parse::<u64>().map_err(|_| Error::MalformedTrackTable {
                    row,
                    reason: format!("{} '{}' is not a non-negative integer", name, value),
                })
            };
            let id = parse("track id", fields[0])?;
            let begin = parse("begin frame", fields[1])?;
            let end = parse("end frame", fields[2])?;
            let parent = parse("parent id", fields[3])?;

            let to_label = |name: &str, value: u64| -> Result<Label> {
                Label::try_from(value).map_err(|_| Error::MalformedTrackTable {
                    row,
                    reason: format!("{} {} is out of range", name, value),
                })
            };
            records.push(TrackRecord {
                id: to_label("track id", id)?,
                begin: begin as usize,
                end: end as usize,
                parent: to_label("parent id", parent)?,
            });
        }
        Ok(Self { records })
    }
}

impl fmt::Display for TrackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
