use std::path::PathBuf;

use marksight::config::{ConfigFlags, load_config_flags, parse_flag_tokens, save_theme};
use marksight::theme::ThemeMode;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".marksightrc");
    let content = r"
# comment
--no-watch

--theme light

--log-file=viewer.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_watch);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.log_file, Some(PathBuf::from("viewer.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".marksightrc");
    std::fs::write(&path, "--no-watch\n--theme light\n--log-file file.log\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "marksight".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_watch, "file flags should remain enabled");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(
        effective.log_file,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "marksight".to_string(),
        "--theme=system".to_string(),
        "--log-file=viewer.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(ThemeMode::System));
    assert_eq!(flags.log_file, Some(PathBuf::from("viewer.log")));
}

#[test]
fn test_cycled_theme_persists_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marksight").join("config");

    let mut mode = ThemeMode::System;
    for _ in 0..2 {
        mode = mode.next();
        save_theme(&path, mode).unwrap();
    }
    let loaded = load_config_flags(&path).unwrap();
    assert_eq!(loaded.theme, Some(ThemeMode::Dark));
    assert_eq!(
        loaded,
        ConfigFlags {
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        }
    );
}
