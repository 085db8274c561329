//! Now-playing feed and the per-run snapshot.
//!
//! ## Feed shape
//!
//!   <anything>
//!     <Events>
//!       <SS32Event>
//!         <Artist>David Bowie</Artist>
//!         <Title>Heroes</Title>
//!         ...
//!       </SS32Event>
//!     </Events>
//!   </anything>
//!
//! Only the first `SS32Event` of the first `Events` block is read. Everything
//! else in the export is ignored.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, DurationRound, Local, TimeDelta};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::{PlaylistError, Result};

const EVENTS: &[u8] = b"Events";
const SS32_EVENT: &[u8] = b"SS32Event";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Artist,
    Title,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"Artist" => Some(Self::Artist),
            b"Title" => Some(Self::Title),
            _ => None,
        }
    }
}

/// Artist and title as found in the feed, already trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub artist: String,
    pub title: String,
}

/// Everything one run renders, computed once and passed down.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current_time: String,
    pub artist: String,
    pub title: String,
}

impl Snapshot {
    /// Read the feed and stamp it with `now` formatted by `time_format`.
    pub async fn capture(feed_path: &Path, time_format: &str, now: DateTime<Local>) -> Result<Self> {
        let record = read_feed(feed_path).await?;
        Ok(Self {
            current_time: format_current_time(now, time_format),
            artist: record.artist,
            title: record.title,
        })
    }
}

pub async fn read_feed(path: &Path) -> Result<FeedRecord> {
    let xml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PlaylistError::MissingSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let record = parse_feed(&xml).map_err(|reason| PlaylistError::MissingSource {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!("[feed] {:?} - {:?}", record.artist, record.title);
    Ok(record)
}

/// Parse the XML export. `Err` carries a human-readable reason.
///
/// Streams the document and stops at the end of the first `SS32Event`, so
/// sibling elements, later events and repeated children never matter.
pub fn parse_feed(xml: &str) -> std::result::Result<FeedRecord, String> {
    let mut reader = Reader::from_str(xml);
    // Root element is depth 1.
    let mut depth = 0usize;
    let mut events_depth: Option<usize> = None;
    let mut event_depth: Option<usize> = None;
    let mut capture: Option<(Field, String)> = None;
    let mut artist: Option<String> = None;
    let mut title: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                let name = name.as_ref();
                match (events_depth, event_depth) {
                    (None, _) if depth == 2 && name == EVENTS => events_depth = Some(depth),
                    (Some(d), None) if depth == d + 1 && name == SS32_EVENT => {
                        event_depth = Some(depth)
                    }
                    (_, Some(d)) if depth == d + 1 => {
                        capture = Field::from_tag(name).map(|f| (f, String::new()))
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                let name = name.as_ref();
                match (events_depth, event_depth) {
                    (None, _) if depth == 1 && name == EVENTS => {
                        return Err("no Events/SS32Event record".to_string())
                    }
                    // <SS32Event/>: a record with no fields at all.
                    (Some(d), None) if depth == d && name == SS32_EVENT => break,
                    (_, Some(d)) if depth == d => match Field::from_tag(name) {
                        Some(Field::Artist) => {
                            artist.get_or_insert_with(String::new);
                        }
                        Some(Field::Title) => {
                            title.get_or_insert_with(String::new);
                        }
                        None => {}
                    },
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some((_, buf)) = capture.as_mut() {
                    buf.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = capture.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                match (events_depth, event_depth) {
                    (_, Some(d)) if depth == d + 1 => {
                        // First occurrence of each field wins.
                        match capture.take() {
                            Some((Field::Artist, v)) if artist.is_none() => artist = Some(v),
                            Some((Field::Title, v)) if title.is_none() => title = Some(v),
                            _ => {}
                        }
                    }
                    (_, Some(d)) if depth == d => break,
                    (Some(d), None) if depth == d => {
                        return Err("no Events/SS32Event record".to_string())
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => return Err("no Events/SS32Event record".to_string()),
            _ => {}
        }
    }

    Ok(FeedRecord {
        artist: field_or_marker(artist, "Artist"),
        title: field_or_marker(title, "Title"),
    })
}

fn field_or_marker(value: Option<String>, name: &str) -> String {
    match value {
        Some(v) => v.trim().to_string(),
        None => {
            warn!("[feed] field '{}' missing from SS32Event", name);
            missing_field_marker(name)
        }
    }
}

/// Shown in place of a value the feed did not provide.
pub fn missing_field_marker(name: &str) -> String {
    format!("(Error: field '{}' missing)", name)
}

/// Format `now`, rounded to the nearest second. An invalid format string
/// falls back to the default 12-hour clock.
pub fn format_current_time(now: DateTime<Local>, fmt: &str) -> String {
    let rounded = now.duration_round(TimeDelta::seconds(1)).unwrap_or(now);
    let mut out = String::new();
    if write!(out, "{}", rounded.format(fmt)).is_ok() {
        return out;
    }
    warn!("[feed] invalid time format {:?}, using default", fmt);
    rounded.format("%-l:%M %p").to_string()
}
