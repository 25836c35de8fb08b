use tfscope::analyze;
use tfscope::correlation::CorrelationGrouper;
use tfscope::observer::feed_all;
use tfscope::parser::parse_line;

#[test]
fn groups_preserve_stream_order() {
    let lines: Vec<String> = (0..10)
        .map(|i| match i {
            3 | 7 | 9 => format!("[DEBUG] step {i} tf_req_id=req-42"),
            5 => format!("[DEBUG] step {i} tf_req_id=req-7"),
            _ => format!("[DEBUG] step {i}"),
        })
        .collect();
    let r = analyze(&lines.join("\n"));
    assert_eq!(r.correlation_groups["req-42"], vec![3, 7, 9]);
    assert_eq!(r.correlation_groups["req-7"], vec![5]);
    assert_eq!(r.correlation_groups.len(), 2);
}

#[test]
fn blank_lines_do_not_shift_group_indices() {
    let text = "a tf_req_id=x\n\n\nb\n   \nc tf_req_id=x\n";
    let r = analyze(text);
    assert_eq!(r.correlation_groups["x"], vec![0, 2]);
}

#[test]
fn structured_and_plain_lines_share_groups() {
    let es = vec![
        parse_line(r#"{"@message":"Request","tf_req_id":"abc","@timestamp":"2024-03-01T10:00:00Z"}"#),
        parse_line("unrelated"),
        parse_line("2024-03-01T10:00:01Z [DEBUG] response tf_req_id=abc"),
    ];
    let mut grouper = CorrelationGrouper::default();
    feed_all(&mut grouper, &es);
    let groups = grouper.finish();
    assert_eq!(groups["abc"], vec![0, 2]);
}

#[test]
fn entries_without_id_are_not_grouped() {
    let r = analyze("one\ntwo\nthree");
    assert!(r.correlation_groups.is_empty());
}
