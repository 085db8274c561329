//! Append-only play history.
//!
//! ## Log format (plain text, four lines per play)
//!
//!   2024 01 01      date stamp, written at append time
//!   3:00 PM         time of play as shown on the now-playing page
//!   David Bowie     artist
//!   Heroes          title
//!
//! No header, no delimiters beyond newlines. A trailing partial record is
//! ignored on read.

use std::path::Path;

use chrono::{DateTime, Local};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

use crate::error::{PlaylistError, Result};

pub const LINES_PER_SONG: usize = 4;

/// One line per field, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayEvent {
    pub date: String,
    pub time: String,
    pub artist: String,
    pub title: String,
}

impl PlayEvent {
    /// Build an event stamped with `now`'s calendar date.
    pub fn stamped(
        now: DateTime<Local>,
        date_format: &str,
        time: &str,
        artist: &str,
        title: &str,
    ) -> Self {
        Self {
            date: now.date_naive().format(date_format).to_string(),
            time: time.to_string(),
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }
}

/// History as three parallel columns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryColumns {
    pub times: Vec<String>,
    pub artists: Vec<String>,
    pub titles: Vec<String>,
}

impl HistoryColumns {
    pub(crate) fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn push(&mut self, event: &PlayEvent) {
        self.times.push(event.time.clone());
        self.artists.push(event.artist.clone());
        self.titles.push(event.title.clone());
    }
}

impl<'a> FromIterator<&'a PlayEvent> for HistoryColumns {
    fn from_iter<I: IntoIterator<Item = &'a PlayEvent>>(iter: I) -> Self {
        let mut cols = Self::default();
        for event in iter {
            cols.push(event);
        }
        cols
    }
}

/// Parse complete records from the log text. Returns the events and the
/// number of trailing lines that did not form a whole record.
pub fn parse_history(content: &str) -> (Vec<PlayEvent>, usize) {
    let lines: Vec<&str> = content.lines().collect();
    let events = lines
        .chunks_exact(LINES_PER_SONG)
        .map(|rec| PlayEvent {
            date: rec[0].to_string(),
            time: rec[1].to_string(),
            artist: rec[2].to_string(),
            title: rec[3].to_string(),
        })
        .collect();
    (events, lines.len() % LINES_PER_SONG)
}

/// Serialize one record, newline-terminated.
pub fn encode_event(event: &PlayEvent) -> String {
    format!(
        "{}\n{}\n{}\n{}\n",
        single_line(&event.date),
        single_line(&event.time),
        single_line(&event.artist),
        single_line(&event.title),
    )
}

/// Fold CR/LF into spaces so a value always occupies exactly one line.
pub fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// Read the whole log, append `event`, and return the history including it.
///
/// Prior content is never rewritten. A missing log is created empty.
///
/// A trailing partial record is left in place and the new record is written
/// after it, so every later parse of the log is misaligned by the leftover
/// lines. That case is logged at error level; the log needs manual repair.
pub async fn append_and_reload(path: &Path, event: &PlayEvent) -> Result<HistoryColumns> {
    let mut f = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| PlaylistError::storage(path, e))?;

    let mut content = String::new();
    f.read_to_string(&mut content)
        .await
        .map_err(|e| PlaylistError::storage(path, e))?;

    let (events, leftover) = parse_history(&content);
    if leftover > 0 {
        error!(
            "[history] {} trailing line(s) in {:?} do not form a record; \
             records appended after them will be misaligned until the log is repaired",
            leftover, path
        );
    }

    // Cursor is at EOF after the full read.
    let mut record = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        record.push('\n');
    }
    record.push_str(&encode_event(event));
    f.write_all(record.as_bytes())
        .await
        .map_err(|e| PlaylistError::storage(path, e))?;
    f.flush().await.map_err(|e| PlaylistError::storage(path, e))?;

    let mut cols: HistoryColumns = events.iter().collect();
    cols.push(&sanitized(event));
    info!(
        "[history] appended {:?} - {:?} ({} plays)",
        event.artist,
        event.title,
        cols.len()
    );
    Ok(cols)
}

fn sanitized(event: &PlayEvent) -> PlayEvent {
    PlayEvent {
        date: single_line(&event.date),
        time: single_line(&event.time),
        artist: single_line(&event.artist),
        title: single_line(&event.title),
    }
}

/// Read-only view of the log, oldest first. A missing file is empty history.
pub async fn load_history(path: &Path) -> Result<Vec<PlayEvent>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_history(&content).0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(PlaylistError::storage(path, e)),
    }
}
