use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_curtain")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "curtain.exe"
            } else {
                "curtain"
            });
            p
        })
}

fn run(args: &[&str]) -> serde_json::Value {
    let out = std::process::Command::new(exe())
        .args(args)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn cli_transition_prints_phase_trace() {
    let v = run(&["transition", "--from", "/", "--to", "/signal"]);
    assert_eq!(v["outcome"], "started");
    assert_eq!(v["route"], "/signal");
    let phases: Vec<&str> = v["trace"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["phase"].as_str().unwrap())
        .collect();
    assert_eq!(phases.first(), Some(&"covering_out"));
    assert_eq!(phases.last(), Some(&"done"));
    assert!(phases.contains(&"revealing_in"));
}

#[test]
fn cli_scroll_reports_pin() {
    let v = run(&[
        "scroll", "--items", "5", "--viewport", "800", "--offset", "1600",
    ]);
    assert_eq!(v["progress"], 0.5);
    assert_eq!(v["pinned"], true);
    assert_eq!(v["pin_offset"], 1600.0);
}

#[test]
fn cli_schedule_reads_config() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg = dir.join("site.json");
    std::fs::write(&cfg, r#"{ "intro": { "delay": 2.0 } }"#).unwrap();

    let cfg_arg = cfg.to_string_lossy().to_string();
    let v = run(&["--config", cfg_arg.as_str(), "schedule", "--page", "/signal"]);
    assert_eq!(v["page"], "signal");
    let first = &v["entries"][0];
    assert_eq!(first["start"], 2.0);
    assert_eq!(first["text"], "S");
}

#[test]
fn cli_rejects_unknown_route() {
    let status = std::process::Command::new(exe())
        .args(["schedule", "--page", "/nowhere"])
        .status()
        .unwrap();
    assert!(!status.success());
}
