//! Unit tests for `AppError` display format and conversions.

use chat_commander::AppError;

#[test]
fn display_prefixes_name_the_kind() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Db("x".into()), "db: x"),
        (AppError::Gateway("x".into()), "gateway: x"),
        (AppError::Generation("x".into()), "generation: x"),
        (AppError::Playlist("x".into()), "playlist: x"),
        (AppError::Search("x".into()), "search: x"),
        (AppError::NotFound("x".into()), "not found: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= broken")
        .unwrap_err()
        .into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn json_errors_become_db_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(err.to_string().starts_with("db: invalid json column"));
}

#[test]
fn io_errors_become_io_errors() {
    let err: AppError = std::io::Error::other("disk full").into();
    assert_eq!(err.to_string(), "io: disk full");
}

#[test]
fn app_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Db("x".into()));
}
