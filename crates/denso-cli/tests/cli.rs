//! CLI E2E tests.
//!
//! Each test runs the built `denso` binary against its own temporary home
//! directory, so nothing touches the real data directory.

use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

struct Sandbox {
    home: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_denso"))
            .args(args)
            .env("HOME", self.home.path())
            .env("DENSO_ENV", "dev")
            .env_remove("DENSO_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.ok(args)).expect("Failed to parse JSON output")
    }
}

#[test]
fn fresh_status_is_a_stopped_pomodoro() {
    let sandbox = Sandbox::new();
    let status = sandbox.json(&["timer", "status"]);
    assert_eq!(status["mode"], "pomodoro");
    assert_eq!(status["phase"], "work");
    assert_eq!(status["is_running"], false);
    assert_eq!(status["display_secs"], 1500);
    assert!(sandbox.home.path().join(".config/denso-dev/denso.db").exists());
}

#[test]
fn timer_state_persists_between_runs() {
    let sandbox = Sandbox::new();
    let started = sandbox.json(&["timer", "start"]);
    assert_eq!(started["type"], "timer_started");
    assert_eq!(sandbox.json(&["timer", "status"])["is_running"], true);

    let paused = sandbox.json(&["timer", "pause"]);
    assert_eq!(paused["type"], "timer_paused");
    assert_eq!(sandbox.json(&["timer", "status"])["is_running"], false);

    sandbox.ok(&["timer", "mode", "free"]);
    assert_eq!(sandbox.json(&["timer", "status"])["mode"], "free");
}

#[test]
fn save_requires_free_mode_and_time() {
    let sandbox = Sandbox::new();
    let (_, stderr, code) = sandbox.run(&["timer", "save"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    sandbox.ok(&["timer", "mode", "free"]);
    let (_, stderr, code) = sandbox.run(&["timer", "save"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing to save"));
}

#[test]
fn saved_free_time_is_recorded() {
    let sandbox = Sandbox::new();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let block = sandbox
        .ok(&["calendar", "add", "Review", "--date", &today, "--subject", "1"])
        .trim()
        .to_string();

    sandbox.ok(&["timer", "mode", "free"]);
    sandbox.ok(&["timer", "start"]);
    sleep(Duration::from_millis(1_300));
    let saved = sandbox.json(&["timer", "save"]);
    assert_eq!(saved["type"], "session_completed");
    let saved_secs = saved["duration_secs"].as_u64().unwrap();
    assert!(saved_secs >= 1);
    assert_eq!(sandbox.json(&["timer", "status"])["display_secs"], 0);

    let recent = sandbox.json(&["stats", "recent"]);
    assert_eq!(recent.as_array().unwrap().len(), 1);
    assert_eq!(recent[0]["duration"], saved_secs);
    assert_eq!(recent[0]["subjectId"], "1");
    assert_eq!(recent[0]["date"], today);
    assert_eq!(sandbox.json(&["stats", "show"])["total_sessions"], 1);

    let achievements = sandbox.json(&["achievements", "--unlocked"]);
    let ids: Vec<_> = achievements["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&"first_session".to_string()));

    let events = sandbox.json(&["calendar", "list"]);
    assert_eq!(events[0]["id"], block);
    assert_eq!(events[0]["completed"], true);
}

#[test]
fn status_records_work_that_finished_between_runs() {
    let sandbox = Sandbox::new();
    sandbox.ok(&["subject", "durations", "1", "--work", "1"]);
    assert_eq!(sandbox.json(&["timer", "start"])["display_secs"], 60);

    sleep(Duration::from_millis(61_500));
    let out = sandbox.ok(&["timer", "status"]);
    let docs: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&out)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(docs[0]["phase"], "break");
    assert_eq!(docs[0]["pomodoro_count"], 1);
    assert!(docs.iter().any(|d| d["type"] == "session_completed"));

    let recent = sandbox.json(&["stats", "recent"]);
    assert_eq!(recent.as_array().unwrap().len(), 1);
    assert_eq!(recent[0]["duration"], 60);

    // A second look does not record the same work again.
    sandbox.ok(&["timer", "status"]);
    assert_eq!(sandbox.json(&["stats", "recent"]).as_array().unwrap().len(), 1);
}

#[test]
fn subjects_and_todos() {
    let sandbox = Sandbox::new();
    let list = sandbox.ok(&["subject", "list"]);
    assert!(list.contains("General"));

    let id = sandbox.ok(&["subject", "add", "Math"]).trim().to_string();
    sandbox.ok(&["subject", "use", &id]);
    let todo = sandbox.ok(&["todo", "add", "Chapter 3"]).trim().to_string();
    assert_eq!(sandbox.ok(&["todo", "toggle", &todo]).trim(), "done");

    let todos = sandbox.json(&["todo", "list"]);
    assert_eq!(todos[0]["text"], "Chapter 3");
    assert_eq!(todos[0]["completed"], true);

    sandbox.ok(&["subject", "delete", &id]);
    let (_, stderr, code) = sandbox.run(&["subject", "delete", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("last remaining subject"));
}

#[test]
fn calendar_and_goal() {
    let sandbox = Sandbox::new();
    sandbox.ok(&["calendar", "add", "Final", "--date", "2999-01-15", "--kind", "exam"]);
    let exams = sandbox.json(&["calendar", "exams"]);
    assert_eq!(exams[0]["title"], "Final");
    assert_eq!(exams[0]["type"], "exam");

    let (_, _, code) = sandbox.run(&["calendar", "add", "Bad", "--date", "tomorrow"]);
    assert_eq!(code, 1);

    sandbox.ok(&["goal", "set", "10"]);
    assert!(sandbox.ok(&["goal", "show"]).contains("10h 0m"));
    let stats = sandbox.json(&["stats", "show"]);
    assert_eq!(stats["weekly_goal"], 36_000);
    assert_eq!(stats["week_total"], 0);

    let heatmap = sandbox.json(&["stats", "heatmap", "--weeks", "2"]);
    assert_eq!(heatmap["days"].as_array().unwrap().len(), 14);
    assert_eq!(heatmap["active_days"], 0);
}

#[test]
fn config_get_set() {
    let sandbox = Sandbox::new();
    assert_eq!(sandbox.ok(&["config", "get", "timer.work_minutes"]).trim(), "25");
    sandbox.ok(&["config", "set", "timer.work_minutes", "50"]);
    assert_eq!(sandbox.ok(&["config", "get", "timer.work_minutes"]).trim(), "50");

    let (_, stderr, code) = sandbox.run(&["config", "set", "ui.theme", "neon"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ui.theme"));

    let achievements = sandbox.json(&["achievements"]);
    assert_eq!(achievements["unlocked"], 0);
    assert_eq!(achievements["total"], 19);
}
