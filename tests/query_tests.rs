use chrono::{DateTime, Utc};
use tfscope::analyze;
use tfscope::level::Level;
use tfscope::query::{context, EntryQuery};

const SAMPLE: &str = "\
2024-03-01T10:00:00Z [INFO] aws_instance.web: Creating...
2024-03-01T10:00:30Z [ERROR] aws_instance.web: creation failed [id=i-1]
2024-03-01T10:01:00Z [WARN] aws_s3_bucket.logs: slow
untimed [DEBUG] line
2024-03-01T10:02:00Z [ERROR] provider crashed
";

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn indices(q: &EntryQuery) -> Vec<usize> {
    let r = analyze(SAMPLE);
    q.run(&r).into_iter().map(|(i, _)| i).collect()
}

#[test]
fn empty_query_returns_everything() {
    let q = EntryQuery::default();
    assert!(q.is_empty());
    assert_eq!(indices(&q), vec![0, 1, 2, 3, 4]);
}

#[test]
fn blank_search_is_ignored() {
    let q = EntryQuery { search: Some("   ".into()), ..Default::default() };
    assert!(q.is_empty());
    assert_eq!(indices(&q).len(), 5);
}

#[test]
fn filters_by_level() {
    let q = EntryQuery { levels: vec![Level::Error], ..Default::default() };
    assert_eq!(indices(&q), vec![1, 4]);
    let q = EntryQuery { levels: vec![Level::Warning, Level::Debug], ..Default::default() };
    assert_eq!(indices(&q), vec![2, 3]);
}

#[test]
fn search_is_case_insensitive_regex() {
    let q = EntryQuery { search: Some("AWS_INSTANCE\\.web".into()), ..Default::default() };
    assert_eq!(indices(&q), vec![0, 1]);
}

#[test]
fn invalid_regex_falls_back_to_substring() {
    let q = EntryQuery { search: Some("[id=".into()), ..Default::default() };
    assert_eq!(indices(&q), vec![1]);
}

#[test]
fn time_window_is_half_open_and_drops_untimed() {
    let q = EntryQuery {
        start: Some(at("2024-03-01T10:00:30Z")),
        end: Some(at("2024-03-01T10:02:00Z")),
        ..Default::default()
    };
    assert_eq!(indices(&q), vec![1, 2]);
    let q = EntryQuery { start: Some(at("2024-03-01T10:01:00Z")), ..Default::default() };
    assert_eq!(indices(&q), vec![2, 4]);
}

#[test]
fn filters_combine() {
    let q = EntryQuery {
        levels: vec![Level::Error],
        search: Some("provider".into()),
        ..Default::default()
    };
    assert_eq!(indices(&q), vec![4]);
}

#[test]
fn context_clamps_to_stream() {
    let r = analyze(SAMPLE);
    let around: Vec<usize> = context(&r, 1, 3, 1).into_iter().map(|(i, _)| i).collect();
    assert_eq!(around, vec![0, 1, 2]);
    let tail: Vec<usize> = context(&r, 4, 1, 10).into_iter().map(|(i, _)| i).collect();
    assert_eq!(tail, vec![3, 4]);
    assert!(context(&r, 5, 1, 1).is_empty());
}
