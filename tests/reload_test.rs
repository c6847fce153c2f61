//! End-to-end reload tests: CSV file in, committed documents out.

mod common;

use common::{write_csv, TestHarness};
use farmline::config::{SkipOp, SkipRule};
use farmline::sync::ReloadOptions;
use farmline_db::queries::{collections, documents};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn hash_identities_without_sid_template() {
    let h = TestHarness::new();
    let file = write_csv("Name,Address\nJohn,Highway 37\nBob,Highway 37\n");

    let report = h.reload(file.path(), &ReloadOptions::default()).unwrap();
    assert_eq!(report.documents_written, 2);

    // Content-derived identities are stable across runs and machines.
    let sids = documents::list_sids(&h.conn(), "Test", 1).unwrap();
    assert_eq!(
        sids,
        vec![
            "07330bc766dee3fe914c7670cb2f5b03_Test",
            "42faff52c0de5da86468b71a16f7a9da_Test",
        ]
    );
}

#[test]
fn template_identities_with_sid_template() {
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));
    let file = write_csv("Name,Address\nJohn,Highway 37\nBob,Highway 37\n");

    h.reload(file.path(), &ReloadOptions::default()).unwrap();

    let sids = documents::list_sids(&h.conn(), "Test", 1).unwrap();
    assert_eq!(sids, vec!["Bob_Test", "John_Test"]);
}

// ---------------------------------------------------------------------------
// Duplicate detection
// ---------------------------------------------------------------------------

#[test]
fn shared_rendering_output_maps_later_documents() {
    // Both rows render to the same output name; the first row keeps the
    // output, the second is marked as a duplicate of it.
    let h = TestHarness::with_settings(|s| {
        s.sid_template = Some("[Name]".into());
        s.rendering_template = Some("[Address]".into());
    });
    let file = write_csv("Name,Address\nJohn,Highway 37\nBob,Highway 37\n");

    let report = h.reload(file.path(), &ReloadOptions::default()).unwrap();
    assert_eq!(report.duplicates_mapped, 1);

    let conn = h.conn();
    let john = documents::get_document(&conn, "Test", 1, "John_Test")
        .unwrap()
        .unwrap();
    let bob = documents::get_document(&conn, "Test", 1, "Bob_Test")
        .unwrap()
        .unwrap();
    assert_eq!(john.mapping, None);
    assert_eq!(bob.mapping.as_deref(), Some("John_Test"));
}

#[test]
fn distinct_rendering_outputs_stay_unmapped() {
    let h = TestHarness::with_settings(|s| {
        s.sid_template = Some("[Name]".into());
        s.rendering_template = Some("[Name]_beauty".into());
    });
    let file = write_csv("Name\nJohn\nBob\n");

    let report = h.reload(file.path(), &ReloadOptions::default()).unwrap();
    assert_eq!(report.duplicates_mapped, 0);

    for doc in documents::list_documents(&h.conn(), "Test", 1).unwrap() {
        assert_eq!(doc.mapping, None);
    }
}

// ---------------------------------------------------------------------------
// Reload semantics
// ---------------------------------------------------------------------------

#[test]
fn reload_is_idempotent() {
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));
    let file = write_csv("Name,Status\nJohn,wip\n");

    h.reload(file.path(), &ReloadOptions::default()).unwrap();
    let first = documents::get_document(&h.conn(), "Test", 1, "John_Test")
        .unwrap()
        .unwrap();

    h.reload(file.path(), &ReloadOptions::default()).unwrap();
    let second = documents::get_document(&h.conn(), "Test", 1, "John_Test")
        .unwrap()
        .unwrap();

    assert_eq!(documents::count_documents(&h.conn(), "Test", 1).unwrap(), 1);
    assert_eq!(second.created_at, first.created_at);
}

#[test]
fn replace_retires_the_previous_generation() {
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));

    let first = write_csv("Name\nJohn\nBob\n");
    h.reload(first.path(), &ReloadOptions::default()).unwrap();

    let second = write_csv("Name\nAlice\n");
    let report = h
        .reload(
            second.path(),
            &ReloadOptions {
                replace_existing: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(report.generation, 2);

    let conn = h.conn();
    let collection = collections::get_collection(&conn, "Test").unwrap().unwrap();
    assert_eq!(collection.live_generation, 2);
    assert_eq!(documents::count_documents(&conn, "Test", 1).unwrap(), 0);
    assert_eq!(
        documents::list_sids(&conn, "Test", 2).unwrap(),
        vec!["Alice_Test"]
    );
}

#[test]
fn dry_run_leaves_no_trace() {
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));
    let file = write_csv("Name\nJohn\n");

    let report = h
        .reload(
            file.path(),
            &ReloadOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(report.documents_written, 1);
    assert!(collections::get_collection(&h.conn(), "Test")
        .unwrap()
        .is_none());
}

#[test]
fn header_columns_accumulate_across_reloads() {
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));

    let first = write_csv("Name,Address\nJohn,Highway 37\n");
    h.reload(first.path(), &ReloadOptions::default()).unwrap();

    let second = write_csv("Name,Client\nJohn,acme\n");
    h.reload(second.path(), &ReloadOptions::default()).unwrap();

    let collection = collections::get_collection(&h.conn(), "Test")
        .unwrap()
        .unwrap();
    assert_eq!(collection.columns, vec!["Name", "Address", "Client"]);
}

// ---------------------------------------------------------------------------
// Row filtering and enrichment
// ---------------------------------------------------------------------------

#[test]
fn skip_rules_filter_rows() {
    let h = TestHarness::with_settings(|s| {
        s.sid_template = Some("[Name]".into());
        s.skip_rules = vec![SkipRule {
            column: "Status".into(),
            op: SkipOp::Equals,
            value: "omit".into(),
        }];
    });
    let file = write_csv("Name,Status\nJohn,active\nBob,omit\n");

    let report = h.reload(file.path(), &ReloadOptions::default()).unwrap();
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(
        documents::list_sids(&h.conn(), "Test", 1).unwrap(),
        vec!["John_Test"]
    );
}

#[test]
fn perspectives_fan_out_each_row() {
    let h = TestHarness::with_settings(|s| {
        s.sid_template = Some("[Name]_[perspective]".into());
        s.perspectives = vec!["left".into(), "right".into()];
    });
    let file = write_csv("Name,Perspective\nsp010,\nsp020,left\n");

    let report = h.reload(file.path(), &ReloadOptions::default()).unwrap();
    assert_eq!(report.documents_written, 3);

    let conn = h.conn();
    assert_eq!(
        documents::list_sids(&conn, "Test", 1).unwrap(),
        vec!["sp010_left_Test", "sp010_right_Test", "sp020_left_Test"]
    );
    let pinned = documents::get_document(&conn, "Test", 1, "sp020_left_Test")
        .unwrap()
        .unwrap();
    assert_eq!(pinned.perspective, "left");
}

#[test]
fn preview_name_is_stamped_on_documents() {
    let h = TestHarness::with_settings(|s| {
        s.sid_template = Some("[Name]".into());
        s.preview_template = Some("[Name]_prev".into());
    });
    let file = write_csv("Name\nJohn\n");

    h.reload(file.path(), &ReloadOptions::default()).unwrap();

    let doc = documents::get_document(&h.conn(), "Test", 1, "John_Test")
        .unwrap()
        .unwrap();
    assert_eq!(doc.preview.as_deref(), Some("John_prev"));
    assert_eq!(doc.fields["preview"].as_deref(), Some("John_prev"));
}

#[test]
fn max_pipeline_normalizes_path_columns() {
    // The harness pipeline is a Max pipeline, so path-like columns switch to
    // backslash separators on the way in.
    let h = TestHarness::with_settings(|s| s.sid_template = Some("[Name]".into()));
    let file = write_csv("Name,footage_path\nJohn,x/y/footage.mov\n");

    h.reload(file.path(), &ReloadOptions::default()).unwrap();

    let doc = documents::get_document(&h.conn(), "Test", 1, "John_Test")
        .unwrap()
        .unwrap();
    assert_eq!(
        doc.fields["footage_path"].as_deref(),
        Some("x\\y\\footage.mov")
    );
}
