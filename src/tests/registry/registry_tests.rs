//! Handler registry tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ProcessorConfig;
use crate::format::FormatTag;
use crate::handlers::{HandlerContext, default_registry};
use crate::registry::{HandlerRegistry, handler_fn};
use crate::sink::LoggingSink;

fn counting_handler(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&Path) -> Result<(), crate::error::HandlerError> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_path: &Path| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn new_registry_is_empty() {
    let registry = HandlerRegistry::new();
    assert!(registry.tags().is_empty());
    assert!(registry.get(FormatTag::Csv).is_none());
}

#[test]
fn registered_closure_is_invoked() {
    let registry = HandlerRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    registry.register(FormatTag::Csv, counting_handler(&calls));

    assert!(registry.has_handler(FormatTag::Csv));
    let handler = registry.get(FormatTag::Csv).expect("csv handler");
    handler.handle(Path::new("a.csv")).unwrap();
    handler.handle(Path::new("b.csv")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn registering_again_replaces_the_handler() {
    let registry = HandlerRegistry::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    assert!(
        registry
            .register(FormatTag::Json, counting_handler(&first))
            .is_none()
    );
    assert!(
        registry
            .register(FormatTag::Json, counting_handler(&second))
            .is_some()
    );

    registry
        .get(FormatTag::Json)
        .unwrap()
        .handle(Path::new("x.json"))
        .unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(registry.tags(), vec![FormatTag::Json]);
}

#[test]
fn handler_fn_accepts_unannotated_closures() {
    let registry = HandlerRegistry::new().with_handler(
        FormatTag::Xml,
        handler_fn(|path| Err(format!("rejected {}", path.display()).into())),
    );

    let err = registry
        .get(FormatTag::Xml)
        .unwrap()
        .handle(Path::new("doc.xml"))
        .unwrap_err();
    assert_eq!(err.to_string(), "rejected doc.xml");
}

#[test]
fn unregister_removes_the_handler() {
    let registry = HandlerRegistry::new();
    registry.register(FormatTag::Xml, handler_fn(|_| Ok(())));

    assert!(registry.unregister(FormatTag::Xml).is_some());
    assert!(!registry.has_handler(FormatTag::Xml));
    assert!(registry.unregister(FormatTag::Xml).is_none());
}

#[test]
fn default_registry_covers_every_supported_format() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = HandlerContext::new(
        Arc::new(ProcessorConfig::default()),
        dir.path(),
        Arc::new(LoggingSink),
    );
    let registry = default_registry(ctx);

    for tag in FormatTag::SUPPORTED {
        assert!(registry.has_handler(tag), "{tag}");
    }
    assert!(!registry.has_handler(FormatTag::Unknown));
    assert!(format!("{registry:?}").contains("Csv"));
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = Arc::new(HandlerRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let calls = Arc::clone(&calls);
            std::thread::spawn(move || {
                registry.register(FormatTag::Csv, counting_handler(&calls));
                registry
                    .get(FormatTag::Csv)
                    .unwrap()
                    .handle(Path::new("t.csv"))
                    .unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(registry.tags(), vec![FormatTag::Csv]);
}
