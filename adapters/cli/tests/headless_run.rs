use std::{fs, process::Command};

fn prey_arena() -> Command {
    Command::new(env!("CARGO_BIN_EXE_prey-arena"))
}

#[test]
fn json_summary_reports_the_requested_run() {
    let output = prey_arena()
        .args(["--seed", "5", "--frames", "20", "--rounds", "2", "--json"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch prey-arena");
    assert!(output.status.success(), "prey-arena exited with {}", output.status);

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout holds the JSON summary");
    assert_eq!(summary["seed"], 5);
    let rounds = summary["rounds"].as_array().expect("rounds array");
    assert_eq!(rounds.len(), 2);
    for (index, round) in rounds.iter().enumerate() {
        assert_eq!(round["round"], index);
        assert!(round["frames"].as_u64().expect("frame count") <= 20);
    }
}

#[test]
fn unbuildable_configs_fail_the_run() {
    let path = std::env::temp_dir().join(format!("prey-arena-flat-{}.toml", std::process::id()));
    fs::write(&path, "sector_size = 0.0\n").expect("write config");

    let output = prey_arena()
        .arg("--config")
        .arg(&path)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch prey-arena");
    let _ = fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sector_size"), "unexpected error output: {stderr}");
}
