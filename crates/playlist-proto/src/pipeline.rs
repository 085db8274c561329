//! One batch run: now-playing page always, latest-songs page on change.

use chrono::{DateTime, Local};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::feed::Snapshot;
use crate::history::{self, PlayEvent};
use crate::recent::{self, Recency};
use crate::render;
use crate::window;

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Same track as last run; only the now-playing page was written.
    Unchanged,
    /// New track; history extended and both pages written.
    Changed { plays: usize },
}

/// Render everything for `snapshot`. `now` supplies the history date stamp.
pub async fn run(config: &Config, snapshot: &Snapshot, now: DateTime<Local>) -> Result<RunOutcome> {
    let paths = &config.paths;

    render::render(
        &render::now_playing_substitutions(snapshot),
        &paths.resolve(&paths.now_playing_template),
        &paths.resolve(&paths.now_playing_output),
    )
    .await?;

    // Loaded before any state is touched: a missing template must not leave
    // the track remembered without its latest-songs page.
    let latest_template = render::Template::load(&paths.resolve(&paths.latest_five_template)).await?;

    let recency =
        recent::check_and_update(&paths.current_song_path(), &snapshot.artist, &snapshot.title)
            .await?;
    if recency == Recency::Same {
        info!("[run] track unchanged, latest songs left as is");
        return Ok(RunOutcome::Unchanged);
    }

    let event = PlayEvent::stamped(
        now,
        &config.format.date_stamp,
        &snapshot.current_time,
        &snapshot.artist,
        &snapshot.title,
    );
    let history = history::append_and_reload(&paths.recent_songs_path(), &event).await?;
    let latest = window::select_latest_from(&history, config.history.window_size);

    latest_template
        .render_to(
            &render::latest_substitutions(&latest),
            &paths.resolve(&paths.latest_five_output),
        )
        .await?;

    Ok(RunOutcome::Changed {
        plays: history.len(),
    })
}
