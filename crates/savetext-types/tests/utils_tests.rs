use savetext_types::{file_name_of, from_unix_seconds, parse_timestamp, to_unix_seconds};
use std::path::Path;

#[test]
fn test_unix_seconds_round_trip_drops_subseconds() {
    let dt = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:34:56.789Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let secs = to_unix_seconds(&dt);
    assert_eq!(secs, 1_714_566_896);
    assert_eq!(
        from_unix_seconds(secs).unwrap().to_rfc3339(),
        "2024-05-01T12:34:56+00:00"
    );
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = from_unix_seconds(1_714_566_896).unwrap();
    assert_eq!(parse_timestamp("2024-05-01T12:34:56Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-05-01 12:34:56"), Some(expected));
    assert_eq!(parse_timestamp("1714566896"), Some(expected));
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_file_name_of_empty_path() {
    assert_eq!(file_name_of(Path::new("")), "");
    assert_eq!(file_name_of(Path::new("dir/log.txt")), "log.txt");
}
