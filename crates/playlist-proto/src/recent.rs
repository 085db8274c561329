//! Repeat-notification guard.
//!
//! The automation system rewrites its export many times per song. The last
//! rendered `(artist, title)` is kept in a two-line file so the history is
//! only extended when the track actually changes.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{PlaylistError, Result};
use crate::history::single_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Same,
    Changed,
}

/// Contents of the remembered-pair file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedPair {
    pub artist: String,
    pub title: String,
}

impl RememberedPair {
    /// `None` unless `content` is exactly two lines.
    fn parse(content: &str) -> Option<Self> {
        match content.lines().collect::<Vec<_>>().as_slice() {
            [artist, title] => Some(Self {
                artist: artist.to_string(),
                title: title.to_string(),
            }),
            _ => None,
        }
    }

    fn matches(&self, artist: &str, title: &str) -> bool {
        self.artist == artist && self.title == title
    }

    #[cfg(test)]
    async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlaylistError::storage(path, e)),
        }
    }
}

/// Compare `(artist, title)` with the remembered pair and replace it when
/// they differ. Comparison is exact, without trimming or case folding.
pub async fn check_and_update(path: &Path, artist: &str, title: &str) -> Result<Recency> {
    let artist = single_line(artist);
    let title = single_line(title);

    let content = {
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
        content
    };

    let remembered = RememberedPair::parse(&content);
    if remembered.is_some_and(|pair| pair.matches(&artist, &title)) {
        debug!("[recent] unchanged: {:?} - {:?}", artist, title);
        return Ok(Recency::Same);
    }

    write_pair(path, &artist, &title).await?;
    info!("[recent] now playing {:?} - {:?}", artist, title);
    Ok(Recency::Changed)
}

/// Write the pair beside `path` and rename it into place.
async fn write_pair(path: &Path, artist: &str, title: &str) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut f = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| PlaylistError::storage(&tmp, e))?;
        f.write_all(format!("{}\n{}\n", artist, title).as_bytes())
            .await
            .map_err(|e| PlaylistError::storage(&tmp, e))?;
        f.flush().await.map_err(|e| PlaylistError::storage(&tmp, e))?;
        f.sync_all()
            .await
            .map_err(|e| PlaylistError::storage(&tmp, e))?;
    }
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| PlaylistError::storage(path, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
