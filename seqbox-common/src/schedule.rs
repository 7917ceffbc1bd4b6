//! Schedule model and CSV loading
//!
//! A schedule is an ordered list of timed commands produced from a tabular
//! source. Each row carries a time offset in minutes since schedule start and
//! a short command token sent to the device as raw bytes.
//!
//! Offsets are assumed non-decreasing but this is not validated at load time,
//! so malformed schedules remain loadable for diagnostics. The player clamps
//! negative or zero inter-entry gaps to a zero-length wait instead.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::time::minutes_to_duration;

/// Header of the required time-offset column (matched case-insensitively)
pub const TIME_COLUMN: &str = "Time (min)";

/// Header of the required command column (matched case-insensitively)
pub const OUTPUT_COLUMN: &str = "Output";

/// Schedule loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// Schedule source could not be opened
    #[error("schedule source not found: {0}")]
    NotFound(String),

    /// A required field is missing or unparsable
    #[error("malformed schedule at line {line}: {details}")]
    Malformed { line: usize, details: String },
}

/// One timed command: send `command` at `offset_minutes` after schedule start
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// Time since schedule start, in minutes
    pub offset_minutes: f64,

    /// Command payload, written to the channel verbatim
    pub command: Vec<u8>,
}

impl ScheduleEntry {
    pub fn new(offset_minutes: f64, command: impl Into<Vec<u8>>) -> Self {
        Self {
            offset_minutes,
            command: command.into(),
        }
    }
}

/// Ordered, read-only sequence of timed commands
///
/// Order is significant and fixed at load time; the player never reorders
/// entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Build a schedule directly from entries (mainly for tests and tools)
    pub fn from_entries(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    /// Load a schedule from a CSV file
    ///
    /// Requires `Time (min)` and `Output` columns (any column order, headers
    /// matched case-insensitively). Fails with [`LoadError::NotFound`] if the
    /// file cannot be opened and [`LoadError::Malformed`] if any row is
    /// missing a required field or its offset does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| LoadError::NotFound(format!("{}: {}", path.display(), e)))?;
        Self::load_reader(file)
    }

    /// Load a schedule from any CSV reader
    pub fn load_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::Reader::from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| LoadError::Malformed {
                line: 1,
                details: format!("unreadable header row: {}", e),
            })?
            .clone();

        let time_col = find_column(&headers, TIME_COLUMN).ok_or_else(|| LoadError::Malformed {
            line: 1,
            details: format!("missing required column '{}'", TIME_COLUMN),
        })?;
        let output_col =
            find_column(&headers, OUTPUT_COLUMN).ok_or_else(|| LoadError::Malformed {
                line: 1,
                details: format!("missing required column '{}'", OUTPUT_COLUMN),
            })?;

        let mut entries = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            // header occupies line 1; data starts at line 2
            let line = i + 2;
            let record = record.map_err(|e| LoadError::Malformed {
                line,
                details: format!("unreadable row: {}", e),
            })?;

            let raw_offset = record.get(time_col).ok_or_else(|| LoadError::Malformed {
                line,
                details: format!("missing '{}' field", TIME_COLUMN),
            })?;
            let offset_minutes: f64 =
                raw_offset
                    .trim()
                    .parse()
                    .map_err(|_| LoadError::Malformed {
                        line,
                        details: format!("unparsable time offset '{}'", raw_offset),
                    })?;
            if !offset_minutes.is_finite() {
                return Err(LoadError::Malformed {
                    line,
                    details: format!("non-finite time offset '{}'", raw_offset),
                });
            }

            let command = record.get(output_col).ok_or_else(|| LoadError::Malformed {
                line,
                details: format!("missing '{}' field", OUTPUT_COLUMN),
            })?;
            let command = command.trim();
            if command.is_empty() {
                return Err(LoadError::Malformed {
                    line,
                    details: format!("empty '{}' field", OUTPUT_COLUMN),
                });
            }

            entries.push(ScheduleEntry::new(offset_minutes, command.as_bytes().to_vec()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScheduleEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleEntry> {
        self.entries.iter()
    }

    /// Wait between entry `index` and the next one, `None` after the last
    ///
    /// Computed as `max(0, offset[i+1] - offset[i])` minutes. Out-of-order or
    /// duplicate offsets degrade to a zero wait (fire immediately) rather
    /// than failing the run; gaps beyond `Duration`'s range saturate.
    pub fn wait_after(&self, index: usize) -> Option<Duration> {
        let current = self.entries.get(index)?;
        let next = self.entries.get(index + 1)?;
        let gap_minutes = (next.offset_minutes - current.offset_minutes).max(0.0);
        Some(minutes_to_duration(gap_minutes))
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleEntry;
    type IntoIter = std::slice::Iter<'a, ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
