//! FileProcessor control surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::builder::FileProcessorBuilder;
use crate::config::{DirectoryLayout, SchedulerSettings, Settings, WatcherSettings};
use crate::control::FileProcessor;
use crate::error::ExportError;
use crate::format::FormatTag;
use crate::registry::handler_fn;
use crate::tests::{RecordingSink, list_names, wait_until, write_file};

fn fast_builder(base: &std::path::Path) -> FileProcessorBuilder {
    FileProcessorBuilder::new(DirectoryLayout::under(base))
        .with_watcher_settings(WatcherSettings {
            settle_delay: Duration::from_millis(50),
            channel_capacity: 8,
        })
        .with_scheduler_settings(SchedulerSettings {
            tick: Duration::from_millis(10),
            export_interval: Duration::from_millis(100),
        })
}

#[test]
fn building_creates_the_directories() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DirectoryLayout::under(&dir.path().join("work"));

    let processor = FileProcessor::new(layout.clone()).expect("build processor");

    assert!(layout.input.is_dir() && layout.output.is_dir() && layout.archive.is_dir());
    assert_eq!(processor.layout(), &layout);
    assert!(!processor.is_watching());
    for tag in FormatTag::SUPPORTED {
        assert!(processor.registry().has_handler(tag));
    }
}

#[test]
fn from_settings_applies_toggles() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        input_dir: dir.path().join("in"),
        output_dir: dir.path().join("out"),
        archive_dir: dir.path().join("done"),
        archive_on_success: false,
        convert_to_json: true,
        ..Settings::default()
    };

    let processor = FileProcessor::from_settings(&settings).unwrap();

    let status = processor.status();
    assert_eq!(status.input_dir, dir.path().join("in"));
    assert!(!status.toggles.archive_on_success);
    assert!(status.toggles.convert_to_json);
    assert!(status.toggles.backup_before_processing);
}

#[test]
fn toggles_and_status_report() {
    let dir = tempfile::tempdir().unwrap();
    let processor = fast_builder(dir.path()).build().unwrap();

    processor.set_convert_to_json(true);
    processor.set_archive_on_success(false);
    processor.set_backup_before_processing(false);

    let status = processor.status();
    assert!(status.toggles.convert_to_json);
    assert!(!status.toggles.archive_on_success);
    assert!(!status.toggles.backup_before_processing);
    assert!(!status.watching && !status.exports_scheduled);

    let text = status.to_string();
    assert!(text.starts_with("System status:"), "{text}");
    assert!(text.contains("Convert to JSON:   on"), "{text}");
    assert!(text.contains("Archive:           off"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn start_watches_and_schedules_exports() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut processor = fast_builder(dir.path()).with_sink(sink.clone()).build().unwrap();

    processor.start().expect("start");
    processor.start().expect("second start is a no-op");
    assert!(processor.status().watching);
    assert!(processor.status().exports_scheduled);

    let layout = processor.layout().clone();
    write_file(&layout.input.join("data.csv"), "a\n1\n");

    let archived = wait_until(Duration::from_secs(10), || {
        layout.archive.join("data.csv").exists()
    })
    .await;
    let exported = wait_until(Duration::from_secs(10), || {
        list_names(&layout.output)
            .iter()
            .any(|n| n.starts_with("export_") && n.ends_with(".csv"))
    })
    .await;
    processor.stop().await;

    assert!(archived);
    assert!(exported);
    assert_eq!(sink.csv.lock().unwrap().len(), 1);
    assert!(!processor.is_watching());
    assert!(!processor.status().exports_scheduled);
}

#[tokio::test(flavor = "multi_thread")]
async fn registered_handler_applies_to_next_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = fast_builder(dir.path()).build().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    processor.register_handler(
        FormatTag::Xml,
        handler_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );

    processor.start().unwrap();
    let layout = processor.layout().clone();
    write_file(&layout.input.join("doc.xml"), "not even xml");
    let done = wait_until(Duration::from_secs(10), || {
        layout.archive.join("doc.xml").exists()
    })
    .await;
    processor.stop().await;

    assert!(done);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn builder_overrides_are_installed() {
    let dir = tempfile::tempdir().unwrap();
    let processor = fast_builder(dir.path())
        .with_handler(FormatTag::Json, handler_fn(|_| Err("nope".into())))
        .build()
        .unwrap();
    let path = processor.layout().input.join("a.json");
    write_file(&path, "{}");

    let file = processor.process_one(&path);

    assert!(file.error().is_some());
    assert!(path.exists());
}

#[test]
fn manual_export_and_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let processor = fast_builder(dir.path()).build().unwrap();

    let path = processor.manual_export("json").expect("json export");
    assert!(path.exists());

    let err = processor.manual_export("yaml").unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    assert_eq!(
        list_names(&processor.layout().output)
            .iter()
            .filter(|n| n.starts_with("manual_export_"))
            .count(),
        1
    );
}
