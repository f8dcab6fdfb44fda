use std::path::Path;

use assert_cmd::Command;
use mentortype::history::{HistoryLog, HistoryStore};
use mentortype::scoring::ScoreResult;
use mentortype::store::SqliteStore;

fn mentortype(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mentortype").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY");
    cmd
}

fn seed(home: &Path, results: &[(u32, u8)]) {
    let store = SqliteStore::open(home.join(".local/state/mentortype/store.db")).unwrap();
    let history = HistoryStore::new(Box::new(store));
    let mut log = HistoryLog::new();
    for &(wpm, accuracy) in results {
        log = log.append(ScoreResult {
            wpm,
            accuracy,
            date: "3/1/2024".into(),
        });
    }
    history.try_persist(&log).unwrap();
}

#[test]
fn history_without_runs() {
    let home = tempfile::tempdir().unwrap();
    mentortype(home.path())
        .arg("history")
        .assert()
        .success()
        .stdout("No typing history yet.\n");
}

#[test]
fn history_lists_newest_first_with_averages() {
    let home = tempfile::tempdir().unwrap();
    seed(home.path(), &[(40, 90), (60, 100)]);

    let output = mentortype(home.path())
        .arg("history")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("60 WPM"));
    assert!(lines[1].contains("40 WPM"));
    assert_eq!(lines[2], "average 50 WPM / 95%");
}

#[test]
fn history_clear_empties_the_store() {
    let home = tempfile::tempdir().unwrap();
    seed(home.path(), &[(40, 90)]);

    mentortype(home.path())
        .args(["history", "--clear"])
        .assert()
        .success()
        .stdout("History cleared.\n");

    mentortype(home.path())
        .arg("history")
        .assert()
        .success()
        .stdout("No typing history yet.\n");
}
