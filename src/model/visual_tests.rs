//! Unit tests for the visual entity model.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::{Comment, Context, FileRef, Visual};
use crate::model::{IdentityGenerator, VisualId, VisualImportError};

#[fixture]
fn comment() -> Comment {
    Comment::new(
        VisualId::from("1"),
        Context::new(FileRef::new("a.txt"), 10),
        "x",
    )
}

#[rstest]
fn export_matches_wire_layout(comment: Comment) {
    let exported = serde_json::to_string(&comment.export()).expect("export serialises");

    assert_eq!(
        exported,
        r#"{"comment":{"id":"1","context":{"lineNo":10,"file":{"filename":"a.txt"}},"text":"x"}}"#
    );
}

#[rstest]
fn import_inverts_export(comment: Comment) {
    let imported = Comment::import(&comment.export()).expect("round trip should succeed");

    assert_eq!(imported, comment);
}

#[rstest]
fn create_issues_fresh_identity_and_empty_text() {
    let mut ids = IdentityGenerator::new();
    ids.init_id(4);

    let created = Comment::create(&mut ids, Context::new(FileRef::new("lib.rs"), 3));

    assert_eq!(created.id().as_str(), "5", "id should come from the generator");
    assert_eq!(created.text(), "", "text defaults to empty");
}

#[rstest]
fn with_text_keeps_identity_and_context(comment: Comment) {
    let edited = comment.with_text("rewritten");

    assert_eq!(edited.id(), comment.id(), "identity must be preserved");
    assert_eq!(edited.context(), comment.context(), "context must be preserved");
    assert_eq!(edited.text(), "rewritten");
}

#[rstest]
fn import_accepts_line_number_written_as_string() {
    let data = json!({
        "comment": {
            "id": "9",
            "context": { "lineNo": "42", "file": { "filename": "src/main.rs" } },
            "text": "legacy"
        }
    });

    let imported = Comment::import(&data).expect("string line numbers are accepted");

    assert_eq!(imported.context().line_no(), 42);
    assert_eq!(imported.context().file().filename(), "src/main.rs");
}

#[rstest]
fn import_defaults_missing_text_to_empty() {
    let data = json!({
        "comment": { "id": "2", "context": { "lineNo": 1, "file": { "filename": "a" } } }
    });

    let imported = Comment::import(&data).expect("text is optional");

    assert_eq!(imported.text(), "");
}

#[rstest]
#[case::missing_id(json!({ "comment": { "context": { "lineNo": 1, "file": { "filename": "a" } } } }))]
#[case::missing_filename(json!({ "comment": { "id": "1", "context": { "lineNo": 1, "file": {} } } }))]
#[case::missing_line(json!({ "comment": { "id": "1", "context": { "file": { "filename": "a" } } } }))]
#[case::non_numeric_line(json!({ "comment": { "id": "1", "context": { "lineNo": "ten", "file": { "filename": "a" } } } }))]
fn import_rejects_incomplete_records(#[case] data: Value) {
    let result = Comment::import(&data);

    assert!(
        matches!(result, Err(VisualImportError::Malformed { variant: "comment", .. })),
        "expected Malformed, got {result:?}"
    );
}

#[rstest]
fn import_rejects_empty_identity() {
    let data = json!({
        "comment": { "id": "", "context": { "lineNo": 1, "file": { "filename": "a" } } }
    });

    assert_eq!(
        Comment::import(&data),
        Err(VisualImportError::MissingIdentity { variant: "comment" })
    );
}

#[rstest]
fn visual_import_dispatches_on_variant_key(comment: Comment) {
    let visual = Visual::import(&comment.export()).expect("comment variant is known");

    assert_eq!(visual, Visual::Comment(comment));
}

#[rstest]
fn visual_import_reports_unknown_variant() {
    let result = Visual::import(&json!({ "arrow": { "id": "3" } }));

    assert_eq!(
        result,
        Err(VisualImportError::UnknownVariant {
            variant: "arrow".to_owned()
        })
    );
}

#[rstest]
#[case::array(json!([1, 2]))]
#[case::empty_object(json!({}))]
#[case::string(json!("comment"))]
fn visual_import_requires_keyed_object(#[case] data: Value) {
    assert_eq!(Visual::import(&data), Err(VisualImportError::MissingVariant));
}

#[rstest]
fn contexts_compare_by_filename_and_line() {
    let a = Context::new(FileRef::new("a.txt"), 1);

    assert_eq!(a, Context::new(FileRef::new("a.txt"), 1));
    assert_ne!(a, Context::new(FileRef::new("a.txt"), 2));
    assert_ne!(a, Context::new(FileRef::new("b.txt"), 1));
}
