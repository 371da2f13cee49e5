use claude_bridge::config::GlobalConfig;
use claude_bridge::i18n::Lang;

fn sample_toml() -> &'static str {
    r#"
program = "claude"
allowed_models = ["sonnet", "opus"]
language = "es"
max_message_chars = 2000

[telegram]
chat_id = 123456789

[screen]
cols = 100
rows = 30

[timing]
debounce_ms = 800
idle_threshold_ms = 2500
max_wait_ms = 4000
settle_ms = 300
tick_ms = 250

[filter]
noise_substrings = ["ctrl+g", "press esc"]
"#
}

fn minimal_toml() -> &'static str {
    "[telegram]\nchat_id = 42\n"
}

#[test]
fn full_config_parses() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("sample config must parse");
    assert_eq!(config.telegram.chat_id, 123_456_789);
    assert_eq!(config.program, "claude");
    assert_eq!(config.screen.cols, 100);
    assert_eq!(config.screen.rows, 30);
    assert_eq!(config.timing.debounce_ms, 800);
    assert_eq!(config.timing.tick_ms, 250);
    assert_eq!(config.allowed_models, vec!["sonnet", "opus"]);
    assert_eq!(config.language, "es");
    assert_eq!(config.initial_language(), Lang::Es);
    assert_eq!(config.max_message_chars, 2000);
    assert_eq!(config.filter.noise_substrings, vec!["ctrl+g", "press esc"]);
}

#[test]
fn minimal_config_applies_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("minimal config must parse");
    assert_eq!(config.program, "claude");
    assert_eq!(config.screen.cols, 120);
    assert_eq!(config.screen.rows, 40);
    assert_eq!(config.timing.debounce_ms, 1000);
    assert_eq!(config.timing.idle_threshold_ms, 3000);
    assert_eq!(config.timing.max_wait_ms, 5000);
    assert_eq!(config.timing.settle_ms, 500);
    assert_eq!(config.timing.tick_ms, 500);
    assert_eq!(config.allowed_models, vec!["sonnet", "opus", "haiku"]);
    assert_eq!(config.initial_language(), Lang::En);
    assert_eq!(config.max_message_chars, 4000);
    assert!(config
        .filter
        .noise_substrings
        .iter()
        .any(|s| s == "ctrl+g"));
}

#[test]
fn bot_token_is_never_read_from_toml() {
    let raw = "[telegram]\nchat_id = 42\nbot_token = \"123:abc\"\n";
    // serde(skip) means the field is unknown to the deserializer, but
    // the config must never pick the secret up from disk either way.
    if let Ok(config) = GlobalConfig::from_toml_str(raw) {
        assert!(config.telegram.bot_token.is_empty());
    }
}

#[test]
fn missing_chat_id_is_rejected() {
    assert!(GlobalConfig::from_toml_str("[telegram]\nchat_id = 0\n").is_err());
    assert!(GlobalConfig::from_toml_str("").is_err());
}

#[test]
fn zero_screen_dimensions_are_rejected() {
    let raw = "[telegram]\nchat_id = 42\n[screen]\ncols = 0\nrows = 40\n";
    assert!(GlobalConfig::from_toml_str(raw).is_err());
}

#[test]
fn zero_tick_is_rejected() {
    let raw = "[telegram]\nchat_id = 42\n[timing]\ntick_ms = 0\n";
    assert!(GlobalConfig::from_toml_str(raw).is_err());
}

#[test]
fn unknown_language_is_rejected() {
    // Top-level key, so it must come before the [telegram] table.
    let raw = "language = \"fr\"\n[telegram]\nchat_id = 42\n";
    assert!(GlobalConfig::from_toml_str(raw).is_err());
}

#[test]
fn model_allow_list_is_enforced() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).unwrap();
    assert!(config.ensure_allowed_model("haiku").is_ok());
    assert!(config.ensure_allowed_model("gpt4").is_err());
}

#[test]
fn load_from_path_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, sample_toml()).expect("write config");
    let config = GlobalConfig::load_from_path(&path).expect("load config");
    assert_eq!(config.telegram.chat_id, 123_456_789);
}

#[test]
fn load_from_missing_path_fails() {
    assert!(GlobalConfig::load_from_path("/nonexistent/config.toml").is_err());
}

#[test]
fn tick_interval_matches_configured_millis() {
    let config = GlobalConfig::from_toml_str(sample_toml()).unwrap();
    assert_eq!(config.timing.tick().as_millis(), 250);
}
