use calendar_sim::config::{CalendarConfig, Span};
use calendar_sim::CalendarError;
use std::path::PathBuf;

#[test]
fn defaults_are_valid() {
    let config = CalendarConfig::default();
    config.validate().unwrap();

    assert!((config.planner.topic_prune_probability - 0.7).abs() < 1e-6);
    assert_eq!(config.planner.forum_cap, 2);
    assert_eq!(config.thread.commenters, Span::new(2, 4));
    assert_eq!(config.thread.first_delay_minutes, Span::new(15, 90));
    assert_eq!(config.thread.reply_delay_minutes, Span::new(10, 120));
    assert!((config.quality.weights.total() - 1.0).abs() < 1e-6);
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let config = CalendarConfig::from_toml(
        r#"
[planner]
forum_cap = 3

[thread.commenters]
min = 1
max = 2
"#,
    )
    .unwrap();

    assert_eq!(config.planner.forum_cap, 3);
    assert!((config.planner.topic_prune_probability - 0.7).abs() < 1e-6);
    assert_eq!(config.thread.commenters, Span::new(1, 2));
    assert_eq!(config.thread.posting_hours, Span::new(9, 18));
    config.validate().unwrap();
}

#[test]
fn weights_must_sum_to_one() {
    let config = CalendarConfig::from_toml(
        r#"
[quality.weights]
naturalness = 0.5
"#,
    )
    .unwrap();

    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));
}

#[test]
fn out_of_range_values_are_rejected() {
    let mut config = CalendarConfig::default();
    config.thread.reply_probability = 1.5;
    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));

    let mut config = CalendarConfig::default();
    config.thread.posting_hours = Span::new(20, 9);
    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));

    let mut config = CalendarConfig::default();
    config.thread.day_offsets = vec![0, 7];
    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));

    let mut config = CalendarConfig::default();
    config.planner.forum_cap = 0;
    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));

    let mut config = CalendarConfig::default();
    config.quality.bounds.floor = 10.0;
    assert!(matches!(config.validate(), Err(CalendarError::Config(_))));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let result = CalendarConfig::from_toml("planner = [");
    assert!(matches!(result, Err(CalendarError::Config(_))));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let path = PathBuf::from("does/not/exist/calendar.toml");
    let (config, resolved) = CalendarConfig::load(Some(path.clone())).unwrap();

    assert_eq!(resolved, Some(path));
    assert_eq!(config.thread.day_offsets, vec![0, 2, 4, 6, 1, 3, 5]);
}

#[test]
fn written_config_loads_back() {
    let dir = std::env::temp_dir().join(format!("calendar-sim-config-{}", std::process::id()));
    let path = dir.join("calendar.toml");

    let mut config = CalendarConfig::default();
    config.thread.nest_probability = 0.25;
    config.write(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let loaded = CalendarConfig::from_toml(&contents).unwrap();
    assert!((loaded.thread.nest_probability - 0.25).abs() < 1e-6);
    assert_eq!(loaded.thread.posting_hours, config.thread.posting_hours);

    let _ = std::fs::remove_dir_all(&dir);
}
