use std::{env, fs};

use minaret_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("minaret.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081

[fcm]
endpoint = "https://fcm.example.test/v1/messages:send"
auth_token = "file-token"
timeout_ms = 2500

[scheduler]
enabled = true
poll_interval_secs = 30
page_size = 50
due_window_secs = 90

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.fcm.endpoint, "https://fcm.example.test/v1/messages:send");
    assert_eq!(cfg.fcm.timeout_ms, 2500);
    assert_eq!(cfg.scheduler.poll_interval_secs, 30);
    assert_eq!(cfg.scheduler.page_size, 50);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("MINARET__SCHEDULER__PAGE_SIZE", "25");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.scheduler.page_size, 25);
    // cleanup env var
    unsafe {
        env::remove_var("MINARET__SCHEDULER__PAGE_SIZE");
    }

    // 3) Invalid config (empty transport endpoint) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[fcm]
endpoint = ""
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("fcm.endpoint"));

    // 4) Missing file falls back to defaults plus env overrides
    let cfg_default = load_config(Some(
        dir.path().join("does-not-exist.toml").to_str().unwrap(),
    ))
    .expect("defaults should validate");
    assert_eq!(cfg_default.server.port, 8080);
    assert_eq!(cfg_default.scheduler.due_window_secs, 120);
}
