//! Asset tree watcher for template cache invalidation.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::template::TemplateComposer;

/// Watches a live asset directory and drops cached template sets on change.
pub struct AssetWatcher {
    root: PathBuf,
    composer: Arc<TemplateComposer>,
}

impl AssetWatcher {
    pub fn new(root: &Path, composer: Arc<TemplateComposer>) -> Self {
        Self {
            root: root.to_path_buf(),
            composer,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let composer = self.composer.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::debug!(paths = ?event.paths, "Asset change detected");
                        composer.invalidate();
                    }
                }
                Err(e) => tracing::error!(error = %e, "Asset watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = ?self.root, "Asset watcher started");
        Ok(watcher)
    }
}
