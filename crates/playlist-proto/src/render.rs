//! Placeholder substitution into moustache-style templates.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{PlaylistError, Result};
use crate::feed::Snapshot;
use crate::window::WindowEntry;

/// Ordered `(placeholder, raw value)` pairs. Values are escaped on render.
pub type Substitutions = Vec<(String, String)>;

const WINDOW_KEYS: [&str; 3] = ["start_time", "artist", "title"];

/// Escape `& < > " '` for embedding in HTML text or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace every placeholder occurrence in one left-to-right pass.
///
/// At each position the first pair whose placeholder matches wins. Inserted
/// text is never scanned again, so a value containing `{{title}}` comes out
/// literally.
pub fn substitute(template: &str, pairs: &[(String, String)]) -> String {
    let escaped: Vec<(&str, String)> = pairs
        .iter()
        .filter(|(placeholder, _)| !placeholder.is_empty())
        .map(|(placeholder, raw)| (placeholder.as_str(), escape_html(raw)))
        .collect();

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(c) = rest.chars().next() {
        for (placeholder, value) in &escaped {
            if rest.starts_with(*placeholder) {
                out.push_str(value);
                rest = &rest[placeholder.len()..];
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// A template read into memory, ready to be filled.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    text: String,
}

impl Template {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PlaylistError::template(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Substitute `pairs` and overwrite `output_path` with the result.
    pub async fn render_to(&self, pairs: &[(String, String)], output_path: &Path) -> Result<()> {
        let rendered = substitute(&self.text, pairs);
        tokio::fs::write(output_path, rendered)
            .await
            .map_err(|e| PlaylistError::template(output_path, e))?;
        info!("[render] {} -> {}", self.path.display(), output_path.display());
        Ok(())
    }
}

/// Fill `template_path` and overwrite `output_path` with the result.
pub async fn render(pairs: &[(String, String)], template_path: &Path, output_path: &Path) -> Result<()> {
    Template::load(template_path)
        .await?
        .render_to(pairs, output_path)
        .await
}

pub fn now_playing_substitutions(snapshot: &Snapshot) -> Substitutions {
    vec![
        ("{{current_time}}".to_string(), snapshot.current_time.clone()),
        ("{{artist}}".to_string(), snapshot.artist.clone()),
        ("{{title}}".to_string(), snapshot.title.clone()),
    ]
}

/// `{{start_time1}}, {{artist1}}, {{title1}}, {{start_time2}}, ...`; digit 1
/// is the newest entry.
pub fn latest_substitutions(window: &[WindowEntry]) -> Substitutions {
    window
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| {
            let digit = i + 1;
            let values = [&entry.time, &entry.artist, &entry.title];
            WINDOW_KEYS
                .into_iter()
                .zip(values)
                .map(move |(key, value)| (format!("{{{{{}{}}}}}", key, digit), value.clone()))
        })
        .collect()
}
