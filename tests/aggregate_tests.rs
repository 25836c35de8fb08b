use tfscope::aggregate::{provider_reference, resource_references, top_counts, CountItem, CountTable};
use tfscope::analyze;
use tfscope::level::Level;

const SAMPLE: &str = "\
2024-03-01T10:00:05Z [ERROR] provider failed
2024-03-01T10:00:40Z [INFO] still fine
2024-03-01T10:01:10Z [WARN] slow
2024-13-45T99:99:99Z [ERROR] bogus clock
no timestamp here
";

#[test]
fn level_histogram_counts_every_entry() {
    let r = analyze(SAMPLE);
    assert_eq!(r.levels.get(&Level::Error), Some(&2));
    assert_eq!(r.levels.get(&Level::Info), Some(&1));
    assert_eq!(r.levels.get(&Level::Warning), Some(&1));
    assert_eq!(r.levels.get(&Level::Normal), Some(&1));
    assert_eq!(r.levels.get(&Level::Debug), None);
    assert_eq!(r.levels.values().sum::<usize>(), r.entries.len());
}

#[test]
fn errors_reference_entries_in_order() {
    let r = analyze(SAMPLE);
    let indices: Vec<usize> = r.errors.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 3]);
    assert_eq!(r.errors[0].display_text, "2024-03-01T10:00:05Z [ERROR] provider failed");
    assert_eq!(
        r.errors[0].timestamp.as_ref().map(|t| t.to_string()).as_deref(),
        Some("2024-03-01T10:00:05.000Z")
    );
    // unparsed timestamps still travel with the error reference
    assert_eq!(r.errors[1].timestamp.as_ref().map(|t| t.to_string()).as_deref(), Some("2024-13-45T99:99:99Z"));
}

#[test]
fn timeline_buckets_by_minute_and_skips_unparsed() {
    let r = analyze(SAMPLE);
    let expected: CountTable = [
        ("2024-03-01T10:00:00.000Z".to_string(), 2),
        ("2024-03-01T10:01:00.000Z".to_string(), 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(r.timeline, expected);
    let errors: CountTable = [("2024-03-01T10:00:00.000Z".to_string(), 1)].into_iter().collect();
    assert_eq!(r.error_timeline, errors);
}

#[test]
fn resource_references_from_plan_comments_and_blocks() {
    assert_eq!(resource_references("  # module.network.aws_vpc will be created"), vec!["aws_vpc"]);
    assert_eq!(resource_references(r#"resource "aws_instance" "web" {"#), vec!["aws_instance"]);
    assert!(resource_references("aws_instance.web: Creating...").is_empty());
}

#[test]
fn provider_reference_strips_quotes() {
    assert_eq!(
        provider_reference(r#"with provider["registry.terraform.io/hashicorp/aws"],"#),
        Some("registry.terraform.io/hashicorp/aws")
    );
    assert_eq!(provider_reference("provider[aws]"), Some("aws"));
    assert_eq!(provider_reference("no provider here"), None);
}

#[test]
fn structured_resource_type_and_text_reference_both_count() {
    let line = r#"{"@message":"resource \"aws_s3_bucket\" \"logs\" planned","tf_resource_type":"aws_s3_bucket"}"#;
    let r = analyze(line);
    assert_eq!(r.resource_counts.get("aws_s3_bucket"), Some(&2));
}

#[test]
fn provider_counts_accumulate() {
    let text = "\
provider[\"registry.terraform.io/hashicorp/aws\"] configured
provider[\"registry.terraform.io/hashicorp/aws\"] request
provider[\"registry.terraform.io/hashicorp/random\"] ready
";
    let r = analyze(text);
    assert_eq!(r.provider_counts.get("registry.terraform.io/hashicorp/aws"), Some(&2));
    assert_eq!(r.provider_counts.get("registry.terraform.io/hashicorp/random"), Some(&1));
}

#[test]
fn top_counts_orders_by_count_then_name() {
    let table: CountTable = [("a", 3), ("b", 5), ("c", 3), ("d", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let top = top_counts(&table, 3);
    assert_eq!(
        top,
        vec![
            CountItem { name: "b".into(), count: 5 },
            CountItem { name: "a".into(), count: 3 },
            CountItem { name: "c".into(), count: 3 },
        ]
    );
    assert!(top_counts(&table, 0).is_empty());
    assert_eq!(top_counts(&table, 10).len(), 4);
}
