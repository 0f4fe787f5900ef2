mod support;

use std::fs;

use predicates::str::contains;

use checklists::config::{Config, CONFIG_FILE_NAME};
use support::TestHome;

#[test]
fn explicit_config_sets_data_file_and_suffix() -> Result<(), Box<dyn std::error::Error>> {
    let home = TestHome::new();
    let data = home.path().join("elsewhere").join("lists.json");
    let config = home.write_file(
        CONFIG_FILE_NAME,
        &format!(
            "data_file = {:?}\n\n[checklists]\nduplicate_suffix = \" again\"\n\n[auto_reset]\ndefault_reset_after_days = 3\n",
            data.to_str().ok_or("path")?
        ),
    )?;

    let mut cmd = support::cl_cmd();
    cmd.env("HOME", home.path())
        .env("CL_CONFIG", &config)
        .args(["--json", "new", "Laundry", "--auto-reset"])
        .assert()
        .success()
        .stdout(contains("\"reset_after_days\": 3"));
    assert!(data.exists());

    support::cl_cmd()
        .env("HOME", home.path())
        .args(["--config", config.to_str().ok_or("path")?, "dup", "Laundry"])
        .assert()
        .success()
        .stdout(contains("Laundry again"));
    Ok(())
}

#[test]
fn missing_explicit_config_is_user_error() {
    let home = TestHome::new();
    home.cl()
        .args(["--config", "/nonexistent/checklists.toml", "list"])
        .assert()
        .code(2)
        .stderr(contains("config file not found"));
}

#[test]
fn invalid_explicit_config_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let home = TestHome::new();
    let config = home.write_file(CONFIG_FILE_NAME, "lock_timeout_ms = 0\n")?;
    home.cl()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .code(2)
        .stderr(contains("lock_timeout_ms"));
    Ok(())
}

#[test]
fn data_flag_overrides_config() -> Result<(), Box<dyn std::error::Error>> {
    let home = TestHome::new();
    let configured = home.path().join("configured.json");
    let config = home.write_file(
        CONFIG_FILE_NAME,
        &format!("data_file = {:?}\n", configured.to_str().ok_or("path")?),
    )?;
    let flagged = home.path().join("flagged.json");

    support::cl_cmd()
        .env("HOME", home.path())
        .arg("--config")
        .arg(&config)
        .arg("--data")
        .arg(&flagged)
        .args(["new", "Flagged"])
        .assert()
        .success();

    assert!(flagged.exists());
    assert!(!configured.exists());
    Ok(())
}

#[test]
fn saved_config_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let home = TestHome::new();
    let path = home.path().join(CONFIG_FILE_NAME);
    let mut config = Config::default();
    config.auto_reset.sweep_interval = "15m".to_string();
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded, config);
    assert_eq!(loaded.sweep_interval()?.as_secs(), 900);
    Ok(())
}

#[test]
fn init_writes_default_config_once() -> Result<(), Box<dyn std::error::Error>> {
    let home = TestHome::new();
    let path = home.path().join("cfg").join(CONFIG_FILE_NAME);
    let path_arg = path.to_str().ok_or("path")?;

    let data = home.json(&["--config", path_arg, "init"]);
    assert_eq!(data["config_written"], path_arg);
    assert_eq!(Config::load(&path)?, Config::default());

    fs::write(&path, "lock_timeout_ms = 250\n")?;
    let data = home.json(&["--config", path_arg, "init"]);
    assert!(data.get("config_written").is_none());
    assert_eq!(Config::load(&path)?.lock_timeout_ms, 250);
    Ok(())
}
