//! Integration tests for dirmirror
//!
//! These tests drive the reconciler, the audit log and the periodic driver
//! together against real temporary folders.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use dirmirror_config::{ConfigError, SyncOptions};
use dirmirror_sync::{
    relative_entries, AuditLog, CancellationToken, ContentHasher, SyncDriver, TreeReconciler,
};
use dirmirror_tests::test_utils::{assert_mirrored, snapshot, write_file, TreeFixture};
use dirmirror_types::{ChangeKind, ChangeRecord, HashAlgorithm};
use proptest::prelude::*;
use tokio::time::timeout;

fn reconciler() -> TreeReconciler {
    TreeReconciler::new(ContentHasher::default(), SyncOptions::default())
}

fn kinds(records: &[ChangeRecord]) -> Vec<ChangeKind> {
    records.iter().map(|record| record.kind).collect()
}

#[test]
fn test_new_file_is_copied_into_empty_destination() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("a/b.txt", "hello");
    let mut records = Vec::new();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    let copied = fixture.destination.join("a").join("b.txt");
    assert_eq!(fs::read_to_string(&copied).unwrap(), "hello");
    assert_eq!(kinds(&records), vec![ChangeKind::Copied]);
    assert_eq!(records[0].path, copied);
}

#[test]
fn test_identical_trees_produce_no_records() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("a/b.txt", "hello");
    fixture.destination_file("a/b.txt", "hello");
    let mut records = Vec::new();

    let report = reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    assert!(records.is_empty());
    assert!(report.is_empty());
    assert_eq!(report.stats.files_unchanged, 1);
}

#[test]
fn test_changed_content_is_updated() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("a/b.txt", "world");
    fixture.destination_file("a/b.txt", "hello");
    let mut records = Vec::new();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    assert_eq!(
        fs::read_to_string(fixture.destination.join("a/b.txt")).unwrap(),
        "world"
    );
    assert_eq!(kinds(&records), vec![ChangeKind::Updated]);
}

#[test]
fn test_file_missing_from_source_is_deleted() {
    let fixture = TreeFixture::with_destination();
    fs::create_dir_all(fixture.source.join("a")).unwrap();
    let orphan = fixture.destination_file("a/c.txt", "stale");
    let mut records = Vec::new();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    assert!(!orphan.exists());
    assert!(fixture.destination.join("a").is_dir());
    assert_eq!(kinds(&records), vec![ChangeKind::Deleted]);
    assert_eq!(records[0].path, orphan);
}

#[test]
fn test_orphan_directory_tree_is_removed_with_one_record() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("keep.txt", "keep");
    fixture.destination_file("keep.txt", "keep");
    fixture.destination_file("old/deep/x.txt", "x");
    fixture.destination_file("old/y.txt", "y");
    let mut records = Vec::new();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    assert!(!fixture.destination.join("old").exists());
    assert_eq!(kinds(&records), vec![ChangeKind::Deleted]);
    assert_mirrored(&fixture.source, &fixture.destination);
}

#[test]
fn test_mixed_changes_in_one_pass() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("new.txt", "new");
    fixture.source_file("docs/changed.md", "v2");
    fixture.source_file("docs/same.md", "same");
    fs::create_dir_all(fixture.source.join("empty/nested")).unwrap();
    fixture.destination_file("docs/changed.md", "v1");
    fixture.destination_file("docs/same.md", "same");
    fixture.destination_file("docs/gone.md", "gone");
    let mut records = Vec::new();

    let report = reconciler()
        .sync(&fixture.source, &fixture.destination, &mut records)
        .unwrap();

    assert_mirrored(&fixture.source, &fixture.destination);
    assert_eq!(report.stats.files_copied, 1);
    assert_eq!(report.stats.files_updated, 1);
    assert_eq!(report.stats.entries_deleted, 1);
    assert_eq!(report.stats.files_unchanged, 1);
    assert_eq!(report.stats.directories_created, 2);
    assert_eq!(records.len(), 3);
}

#[test]
fn test_second_pass_is_a_no_op() {
    let fixture = TreeFixture::new();
    fixture.source_file("a/b.txt", "hello");
    fixture.source_file("c.bin", [0u8, 1, 2, 3]);
    let mut reconciler = reconciler();

    let first = reconciler
        .sync(&fixture.source, &fixture.destination, &mut ())
        .unwrap();
    let second = reconciler
        .sync(&fixture.source, &fixture.destination, &mut ())
        .unwrap();

    assert_eq!(first.stats.files_copied, 2);
    assert!(second.is_empty());
    assert_eq!(
        relative_entries(&fixture.source).unwrap(),
        relative_entries(&fixture.destination).unwrap()
    );
}

#[test]
fn test_every_hash_algorithm_detects_changes() {
    for algorithm in [HashAlgorithm::Blake3, HashAlgorithm::Xxh3, HashAlgorithm::Md5] {
        let fixture = TreeFixture::with_destination();
        fixture.source_file("f.txt", "after");
        fixture.destination_file("f.txt", "befor");
        let mut reconciler = TreeReconciler::new(
            ContentHasher::with_algorithm(algorithm),
            SyncOptions::default(),
        );

        let report = reconciler
            .sync(&fixture.source, &fixture.destination, &mut ())
            .unwrap();

        assert_eq!(report.stats.files_updated, 1, "{}", algorithm);
        assert_mirrored(&fixture.source, &fixture.destination);
    }
}

#[test]
fn test_audit_log_records_changes() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("a/b.txt", "hello");
    fixture.destination_file("stale.txt", "old");
    let mut audit = AuditLog::new(&fixture.log_file).with_echo(false);
    audit.open().unwrap();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut audit)
        .unwrap();

    let messages = fixture.log_messages();
    assert_eq!(
        messages,
        vec![
            format!("Deleted: {}", fixture.destination.join("stale.txt").display()),
            format!("Copied: {}", fixture.destination.join("a/b.txt").display()),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_one_bad_entry_does_not_stop_the_pass() {
    let fixture = TreeFixture::with_destination();
    fixture.source_file("ok.txt", "fine");
    fixture.source_file("nested/deep.txt", "deep");
    let dangling = fixture.source.join("dangling");
    std::os::unix::fs::symlink(fixture.source.join("nowhere.txt"), &dangling).unwrap();
    let options = SyncOptions {
        follow_symlinks: true,
        ..SyncOptions::default()
    };
    let mut audit = AuditLog::new(&fixture.log_file).with_echo(false);
    audit.open().unwrap();

    let report = TreeReconciler::new(ContentHasher::default(), options)
        .sync(&fixture.source, &fixture.destination, &mut audit)
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.files_copied, 2);
    assert_eq!(
        fs::read_to_string(fixture.destination.join("nested/deep.txt")).unwrap(),
        "deep"
    );
    let skipped: Vec<_> = fixture
        .log_messages()
        .into_iter()
        .filter(|message| message.starts_with("Skipped with error: "))
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].contains(&dangling.display().to_string()));
}

#[test]
fn test_recreated_destination_is_logged() {
    let fixture = TreeFixture::new();
    fixture.source_file("a.txt", "a");
    let mut audit = AuditLog::new(&fixture.log_file).with_echo(false);
    audit.open().unwrap();

    reconciler()
        .sync(&fixture.source, &fixture.destination, &mut audit)
        .unwrap();

    assert_eq!(
        fixture.log_messages(),
        vec![
            format!("Created destination folder: {}", fixture.destination.display()),
            format!("Copied: {}", fixture.destination.join("a.txt").display()),
        ]
    );
}

#[test]
fn test_missing_source_fails_the_pass() {
    let fixture = TreeFixture::with_destination();
    fs::remove_dir_all(&fixture.source).unwrap();

    let result = reconciler().sync(&fixture.source, &fixture.destination, &mut ());

    assert!(result.is_err());
}

#[test]
fn test_config_rejects_destination_inside_source() {
    let fixture = TreeFixture::new();

    let result = fixture
        .builder()
        .destination(fixture.source.join("mirror"))
        .build();

    assert!(matches!(result, Err(ConfigError::NestedPaths { .. })));
}

#[test]
fn test_config_rejects_log_inside_destination() {
    let fixture = TreeFixture::new();

    let result = fixture
        .builder()
        .log_file(fixture.destination.join("sync.log"))
        .build();

    assert!(matches!(
        result,
        Err(ConfigError::LogFileInDestination { .. })
    ));
}

#[test]
fn test_config_rejects_missing_source() {
    let fixture = TreeFixture::new();

    let result = fixture
        .builder()
        .source(fixture.root().join("nowhere"))
        .build();

    assert!(matches!(result, Err(ConfigError::SourceMissing { .. })));
}

#[tokio::test]
async fn test_driver_writes_full_audit_trail() {
    let fixture = TreeFixture::new();
    fixture.source_file("a/b.txt", "hello");
    let config = fixture.builder().max_passes(Some(2)).build().unwrap();
    let audit = AuditLog::new(&config.log_file).with_echo(false);
    let driver = SyncDriver::new(config).with_audit_log(audit);

    let summary = driver.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.passes, 2);
    assert_eq!(summary.failed_passes, 0);
    assert_eq!(summary.stats.files_copied, 1);
    let messages = fixture.log_messages();
    assert_eq!(
        messages[0],
        format!(
            "Started: {} -> {}",
            fixture.source.display(),
            fixture.destination.display()
        )
    );
    assert_eq!(
        messages[1],
        format!("Created destination folder: {}", fixture.destination.display())
    );
    assert_eq!(
        messages[2],
        format!("Copied: {}", fixture.destination.join("a/b.txt").display())
    );
    assert_eq!(messages[3], "Terminated");
    assert_eq!(messages.len(), 4);
}

#[tokio::test]
async fn test_driver_picks_up_changes_between_passes() {
    let fixture = TreeFixture::new();
    fixture.source_file("a/b.txt", "hello");
    let config = fixture.builder().max_passes(Some(2)).build().unwrap();
    let audit = AuditLog::new(&config.log_file).with_echo(false);
    let driver = SyncDriver::new(config).with_audit_log(audit);
    let source = fixture.source.clone();

    let summary = driver
        .run_with(CancellationToken::new(), move |pass, _| {
            if pass == 1 {
                fs::remove_dir_all(source.join("a")).unwrap();
                write_file(&source, "z.txt", "late");
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.stats.files_copied, 2);
    assert_eq!(summary.stats.entries_deleted, 1);
    assert_mirrored(&fixture.source, &fixture.destination);
}

#[tokio::test]
async fn test_driver_stops_when_cancelled_mid_wait() {
    let fixture = TreeFixture::new();
    fixture.source_file("x.txt", "x");
    let config = fixture
        .builder()
        .interval(Duration::from_secs(600))
        .build()
        .unwrap();
    let audit = AuditLog::new(&config.log_file).with_echo(false);
    let driver = SyncDriver::new(config).with_audit_log(audit);
    let token = CancellationToken::new();
    let handle = tokio::spawn(driver.run(token.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();
    let summary = timeout(Duration::from_secs(5), handle)
        .await
        .expect("driver did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(summary.passes, 1);
    assert_eq!(fixture.log_messages().last().unwrap(), "Terminated");
}

fn tree_strategy() -> impl Strategy<Value = BTreeMap<(u8, u8), Vec<u8>>> {
    prop::collection::btree_map(
        (0u8..3, 0u8..4),
        prop::collection::vec(any::<u8>(), 0..64),
        0..8,
    )
}

fn materialize(root: &Path, tree: &BTreeMap<(u8, u8), Vec<u8>>) {
    fs::create_dir_all(root).unwrap();
    for ((dir, name), content) in tree {
        let relative = if *dir == 0 {
            format!("f{}.txt", name)
        } else {
            format!("d{}/f{}.txt", dir, name)
        };
        write_file(root, &relative, content);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_sync_mirrors_any_tree(
        source_tree in tree_strategy(),
        destination_tree in tree_strategy(),
    ) {
        let fixture = TreeFixture::new();
        materialize(&fixture.source, &source_tree);
        materialize(&fixture.destination, &destination_tree);
        let mut reconciler = reconciler();

        let first = reconciler
            .sync(&fixture.source, &fixture.destination, &mut ())
            .unwrap();
        prop_assert!(first.is_success());
        prop_assert_eq!(snapshot(&fixture.source), snapshot(&fixture.destination));

        let second = reconciler
            .sync(&fixture.source, &fixture.destination, &mut ())
            .unwrap();
        prop_assert!(second.is_empty());
    }
}
