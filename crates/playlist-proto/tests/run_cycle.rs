use chrono::{DateTime, Local, TimeZone};
use playlist_proto::config::Config;
use playlist_proto::feed::Snapshot;
use playlist_proto::history::load_history;
use playlist_proto::pipeline::{run, RunOutcome};
use playlist_proto::PlaylistError;
use std::path::Path;
use tempfile::TempDir;

const NOW_PLAYING_TEMPLATE: &str = "<p>{{current_time}}</p>\n<p>{{artist}} - {{title}}</p>\n";

const LATEST_FIVE_TEMPLATE: &str = "\
<li>{{start_time1}} {{artist1}} {{title1}}</li>
<li>{{start_time2}} {{artist2}} {{title2}}</li>
<li>{{start_time3}} {{artist3}} {{title3}}</li>
<li>{{start_time4}} {{artist4}} {{title4}}</li>
<li>{{start_time5}} {{artist5}} {{title5}}</li>
";

fn setup() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("now_playing.moustache"), NOW_PLAYING_TEMPLATE).unwrap();
    std::fs::write(dir.path().join("latest_five.moustache"), LATEST_FIVE_TEMPLATE).unwrap();
    let mut config = Config::default();
    config.paths.work_dir = dir.path().to_path_buf();
    (dir, config)
}

fn write_feed(dir: &Path, artist: &str, title: &str) {
    let xml = format!(
        "<NowPlaying><Events><SS32Event><Artist>{}</Artist><Title>{}</Title></SS32Event></Events></NowPlaying>",
        artist, title
    );
    std::fs::write(dir.join("now_playing.xml"), xml).unwrap();
}

fn at(hour: u32, min: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 1, hour, min, 0).unwrap()
}

async fn run_at(config: &Config, now: DateTime<Local>) -> Result<RunOutcome, PlaylistError> {
    let snapshot = Snapshot::capture(
        &config.paths.feed_path(),
        &config.format.current_time,
        now,
    )
    .await?;
    run(config, &snapshot, now).await
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_first_run_renders_both_pages() {
    let (dir, config) = setup();
    write_feed(dir.path(), "Bowie", "Heroes");

    let outcome = run_at(&config, at(15, 0)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Changed { plays: 1 });

    assert_eq!(
        read(dir.path(), "now_playing.html"),
        "<p>3:00 PM</p>\n<p>Bowie - Heroes</p>\n"
    );
    assert_eq!(
        read(dir.path(), "latest_five.html"),
        "<li>3:00 PM Bowie Heroes</li>\n<li>  </li>\n<li>  </li>\n<li>  </li>\n<li>  </li>\n"
    );
    assert_eq!(read(dir.path(), "current-song.txt"), "Bowie\nHeroes\n");
    assert_eq!(
        read(dir.path(), "recent-songs.txt"),
        "2024 01 01\n3:00 PM\nBowie\nHeroes\n"
    );
}

#[tokio::test]
async fn test_repeat_notification_leaves_latest_untouched() {
    let (dir, config) = setup();
    write_feed(dir.path(), "Bowie", "Heroes");
    run_at(&config, at(15, 0)).await.unwrap();

    std::fs::write(dir.path().join("latest_five.html"), "sentinel").unwrap();
    let outcome = run_at(&config, at(15, 2)).await.unwrap();

    assert_eq!(outcome, RunOutcome::Unchanged);
    assert_eq!(read(dir.path(), "latest_five.html"), "sentinel");
    assert!(read(dir.path(), "now_playing.html").contains("3:02 PM"));
    assert_eq!(load_history(&dir.path().join("recent-songs.txt")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_track_change_updates_pair_and_history() {
    let (dir, config) = setup();
    std::fs::write(dir.path().join("current-song.txt"), "Bowie\nHeroes\n").unwrap();
    write_feed(dir.path(), "Queen", "Bohemian Rhapsody");

    let outcome = run_at(&config, at(15, 4)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Changed { plays: 1 });
    assert_eq!(read(dir.path(), "current-song.txt"), "Queen\nBohemian Rhapsody\n");
}

#[tokio::test]
async fn test_latest_five_rolls_over() {
    let (dir, config) = setup();
    for i in 0..7u32 {
        write_feed(dir.path(), &format!("Artist {}", i), &format!("Song {}", i));
        run_at(&config, at(16, i)).await.unwrap();
    }

    let latest = read(dir.path(), "latest_five.html");
    let rows: Vec<&str> = latest.lines().collect();
    assert_eq!(
        rows,
        [
            "<li>4:06 PM Artist 6 Song 6</li>",
            "<li>4:05 PM Artist 5 Song 5</li>",
            "<li>4:04 PM Artist 4 Song 4</li>",
            "<li>4:03 PM Artist 3 Song 3</li>",
            "<li>4:02 PM Artist 2 Song 2</li>",
        ]
    );
    assert_eq!(load_history(&dir.path().join("recent-songs.txt")).await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_feed_values_are_escaped() {
    let (dir, config) = setup();
    write_feed(dir.path(), "Simon &amp; Garfunkel", "&lt;Live&gt; &quot;Boxer&quot;");

    run_at(&config, at(9, 5)).await.unwrap();
    assert_eq!(
        read(dir.path(), "now_playing.html"),
        "<p>9:05 AM</p>\n<p>Simon &amp; Garfunkel - &lt;Live&gt; &quot;Boxer&quot;</p>\n"
    );
    // Raw, unescaped values in storage.
    assert_eq!(
        read(dir.path(), "current-song.txt"),
        "Simon & Garfunkel\n<Live> \"Boxer\"\n"
    );
}

#[tokio::test]
async fn test_missing_feed_writes_nothing() {
    let (dir, config) = setup();

    let err = run_at(&config, at(15, 0)).await.unwrap_err();
    assert!(matches!(err, PlaylistError::MissingSource { .. }));
    assert!(!dir.path().join("now_playing.html").exists());
    assert!(!dir.path().join("current-song.txt").exists());
    assert!(!dir.path().join("recent-songs.txt").exists());
}

#[tokio::test]
async fn test_missing_latest_template_is_fatal_and_recoverable() {
    let (dir, config) = setup();
    let template = dir.path().join("latest_five.moustache");
    std::fs::remove_file(&template).unwrap();
    write_feed(dir.path(), "Bowie", "Heroes");

    let err = run_at(&config, at(15, 0)).await.unwrap_err();
    assert!(matches!(err, PlaylistError::TemplateUnavailable { .. }));
    assert!(!dir.path().join("latest_five.html").exists());
    assert!(!dir.path().join("current-song.txt").exists());
    assert!(!dir.path().join("recent-songs.txt").exists());

    std::fs::write(&template, LATEST_FIVE_TEMPLATE).unwrap();
    let outcome = run_at(&config, at(15, 1)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Changed { plays: 1 });
    assert!(read(dir.path(), "latest_five.html").starts_with("<li>3:01 PM Bowie Heroes</li>\n"));
}

#[tokio::test]
async fn test_missing_latest_template_after_known_track_keeps_state() {
    let (dir, config) = setup();
    write_feed(dir.path(), "Bowie", "Heroes");
    run_at(&config, at(15, 0)).await.unwrap();

    std::fs::remove_file(dir.path().join("latest_five.moustache")).unwrap();
    write_feed(dir.path(), "Queen", "Bohemian Rhapsody");
    assert!(run_at(&config, at(15, 4)).await.is_err());

    assert_eq!(read(dir.path(), "current-song.txt"), "Bowie\nHeroes\n");
    assert_eq!(load_history(&dir.path().join("recent-songs.txt")).await.unwrap().len(), 1);
}
