use tfscope::analysis::analyze_bytes;
use tfscope::input::{decode, InputError, InputLimits, DEFAULT_MAX_BYTES};

#[test]
fn default_limit_is_two_hundred_mebibytes() {
    assert_eq!(InputLimits::default().max_bytes, 200 * 1024 * 1024);
    assert_eq!(DEFAULT_MAX_BYTES, 209_715_200);
}

#[test]
fn accepts_input_at_the_limit() {
    let limits = InputLimits { max_bytes: 5 };
    assert_eq!(decode(b"hello", &limits).unwrap(), "hello");
}

#[test]
fn rejects_oversized_input() {
    let limits = InputLimits { max_bytes: 4 };
    let err = decode(b"hello", &limits).unwrap_err();
    assert!(matches!(err, InputError::TooLarge { size: 5, limit: 4 }));
    assert_eq!(err.to_string(), "input is 5 bytes, limit is 4");
}

#[test]
fn rejects_invalid_utf8() {
    let err = decode(&[b'o', b'k', 0xff, 0xfe], &InputLimits::default()).unwrap_err();
    assert!(matches!(err, InputError::NotUtf8(_)));
}

#[test]
fn strips_byte_order_mark() {
    let r = analyze_bytes(b"\xef\xbb\xbf[INFO] hello\n", &InputLimits::default()).unwrap();
    assert_eq!(r.entries.len(), 1);
    assert_eq!(r.entries[0].display_text, "[INFO] hello");
}

#[test]
fn empty_input_is_an_empty_result() {
    let r = analyze_bytes(b"", &InputLimits::default()).unwrap();
    assert_eq!(r.total_entries(), 0);
    assert!(r.sections.is_empty());
}
