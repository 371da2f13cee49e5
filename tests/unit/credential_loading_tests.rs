use claude_bridge::config::GlobalConfig;

// Both cases share the TELEGRAM_TOKEN env var, so they run as one test
// to avoid racing against each other in the parallel harness.
#[tokio::test]
async fn env_var_fallback_supplies_the_bot_token() {
    let mut config = GlobalConfig::from_toml_str("[telegram]\nchat_id = 42\n").unwrap();
    assert!(config.telegram.bot_token.is_empty());

    std::env::set_var("TELEGRAM_TOKEN", "12345:test-token");
    config
        .load_credentials()
        .await
        .expect("env var fallback must succeed");
    assert_eq!(config.telegram.bot_token, "12345:test-token");

    // Without keychain entry or env var, credential loading fails.
    std::env::remove_var("TELEGRAM_TOKEN");
    let mut bare = GlobalConfig::from_toml_str("[telegram]\nchat_id = 42\n").unwrap();
    if bare.load_credentials().await.is_ok() {
        // A host keychain may legitimately hold the entry; accept that.
        assert!(!bare.telegram.bot_token.is_empty());
    }
}
