//! Handler registry keyed by format tag.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::ToggleSnapshot;
use crate::error::HandlerError;
use crate::format::FormatTag;

/// A unit of work run for every file of a given format.
///
/// Implemented for any `Fn(&Path) -> Result<(), HandlerError>`, so closures
/// can be registered directly.
pub trait FileHandler: Send + Sync {
    fn handle(&self, path: &Path) -> Result<(), HandlerError>;

    /// Entry point used by the lifecycle manager, with the toggles read when
    /// processing of this file started. Defaults to [`handle`](Self::handle).
    fn handle_with_toggles(
        &self,
        path: &Path,
        toggles: &ToggleSnapshot,
    ) -> Result<(), HandlerError> {
        let _ = toggles;
        self.handle(path)
    }
}

impl<F> FileHandler for F
where
    F: Fn(&Path) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, path: &Path) -> Result<(), HandlerError> {
        self(path)
    }
}

/// Pin a closure's signature so it can be registered without annotations.
///
/// ```rust,ignore
/// registry.register(FormatTag::Csv, handler_fn(|path| {
///     tracing::info!(path = %path.display(), "custom csv handler");
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Path) -> Result<(), HandlerError> + Send + Sync,
{
    f
}

/// Mapping from format tag to its handler. At most one handler per tag.
///
/// Safe to share between the watcher, the control surface and handlers; a
/// registration is seen by the next lookup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<FormatTag, Arc<dyn FileHandler>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags = self.tags();
        tags.sort_by_key(|t| t.to_string());
        f.debug_struct("HandlerRegistry")
            .field("tags", &tags)
            .finish()
    }
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same tag.
    ///
    /// Returns the replaced handler, if any.
    pub fn register<H>(&self, tag: FormatTag, handler: H) -> Option<Arc<dyn FileHandler>>
    where
        H: FileHandler + 'static,
    {
        self.register_arc(tag, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_arc(
        &self,
        tag: FormatTag,
        handler: Arc<dyn FileHandler>,
    ) -> Option<Arc<dyn FileHandler>> {
        if tag == FormatTag::Unknown {
            warn!("handler registered for unknown format; it will never be invoked");
        }
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag, handler);
        if previous.is_some() {
            info!(%tag, "handler replaced");
        }
        previous
    }

    /// Register a handler (builder pattern).
    pub fn with_handler<H>(self, tag: FormatTag, handler: H) -> Self
    where
        H: FileHandler + 'static,
    {
        self.register(tag, handler);
        self
    }

    pub fn get(&self, tag: FormatTag) -> Option<Arc<dyn FileHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .cloned()
    }

    pub fn has_handler(&self, tag: FormatTag) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&tag)
    }

    /// Remove the handler for a tag. Files of that format are then left in place.
    pub fn unregister(&self, tag: FormatTag) -> Option<Arc<dyn FileHandler>> {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tag)
    }

    /// Tags that currently have a handler.
    pub fn tags(&self) -> Vec<FormatTag> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}
