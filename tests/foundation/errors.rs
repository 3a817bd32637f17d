//! Integration tests for Error types
//!
//! Tests error construction, display, and error kinds.

use calltrace_foundation::{Error, ErrorContext, ErrorKind, Value};

#[test]
fn thrown_errors_carry_their_value() {
    let err = Error::thrown(Value::Int(7));
    assert!(matches!(err.kind, ErrorKind::Thrown(_)));
    assert_eq!(err.thrown_value(), Some(&Value::Int(7)));
    assert!(format!("{err}").contains('7'));
}

#[test]
fn not_callable_names_the_kind() {
    let err = Error::not_callable("app.version", "int");
    assert!(matches!(err.kind, ErrorKind::NotCallable { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("app.version"));
    assert!(msg.contains("int"));
    assert_eq!(err.thrown_value(), None);
}

#[test]
fn invalid_pattern_reports_source() {
    let err = Error::invalid_pattern("(", "unclosed group");
    assert!(matches!(err.kind, ErrorKind::InvalidPattern { .. }));
    assert!(format!("{err}").contains("unclosed group"));
}

#[test]
fn member_errors() {
    assert!(matches!(
        Error::member_not_found("x").kind,
        ErrorKind::MemberNotFound(_)
    ));
    assert!(matches!(
        Error::member_access("x", "guarded").kind,
        ErrorKind::MemberAccess { .. }
    ));
}

#[test]
fn context_travels_with_the_error() {
    let err = Error::arity_mismatch("2".to_string(), 3).with_context(
        ErrorContext::new()
            .with_source("app.mail.fetch")
            .with_frame("onInboxClick"),
    );
    assert!(format!("{err}").contains("expected 2"));
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("app.mail.fetch"));
    assert_eq!(context.to_string(), "at app.mail.fetch\n  in onInboxClick\n");
}

#[test]
fn io_errors_convert() {
    let err: Error = std::io::Error::other("disk gone").into();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}
