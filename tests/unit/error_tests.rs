use claude_bridge::AppError;

#[test]
fn display_includes_category_and_detail() {
    let cases = [
        (AppError::Config("bad toml".into()), "config: bad toml"),
        (AppError::Telegram("timeout".into()), "telegram: timeout"),
        (AppError::Spawn("not found".into()), "spawn: not found"),
        (AppError::Pty("no child".into()), "pty: no child"),
        (
            AppError::InvalidInput("bad model".into()),
            "invalid input: bad model",
        ),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_convert_to_config() {
    let parse_err = toml::from_str::<toml::Value>("not = = toml").unwrap_err();
    let err: AppError = parse_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Pty("x".into()));
}
