use crate::history::HistoryColumns;

/// One row of the latest-songs fragment. All fields empty means padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowEntry {
    pub time: String,
    pub artist: String,
    pub title: String,
}

impl WindowEntry {
    pub fn is_padding(&self) -> bool {
        self.time.is_empty() && self.artist.is_empty() && self.title.is_empty()
    }
}

/// The `n` most recent plays, newest first, padded with empty entries to
/// exactly `n`. The count of plays is taken from `titles`.
pub fn select_latest(
    times: &[String],
    artists: &[String],
    titles: &[String],
    n: usize,
) -> Vec<WindowEntry> {
    let count = titles.len();
    let drop = count.saturating_sub(n);
    let field = |col: &[String], i: usize| col.get(i).cloned().unwrap_or_default();

    let mut window: Vec<WindowEntry> = (drop..count)
        .rev()
        .map(|i| WindowEntry {
            time: field(times, i),
            artist: field(artists, i),
            title: field(titles, i),
        })
        .collect();
    window.resize(n, WindowEntry::default());
    window
}

pub fn select_latest_from(history: &HistoryColumns, n: usize) -> Vec<WindowEntry> {
    select_latest(&history.times, &history.artists, &history.titles, n)
}
