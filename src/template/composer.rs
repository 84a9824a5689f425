//! Per-host template set arena.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::assets::source::AssetSource;
use crate::error::ViewError;
use crate::observability::metrics;
use crate::template::set::{
    template_names, TemplateSet, COMPONENTS_NAMESPACE, LAYOUTS_NAMESPACE, PAGES_NAMESPACE,
    VIEWS_NAMESPACE,
};

/// Builds, caches and renders [`TemplateSet`]s keyed by host scope.
///
/// Hosts without any override share the default (`""`) set, so arbitrary
/// `Host` headers cannot grow the cache.
#[derive(Debug)]
pub struct TemplateComposer {
    source: Arc<dyn AssetSource>,
    cache: bool,
    sets: DashMap<String, Arc<TemplateSet>>,
    tenants: RwLock<Option<Arc<BTreeSet<String>>>>,
}

impl TemplateComposer {
    /// `cache = false` rebuilds on every call, for trees edited while serving.
    pub fn new(source: Arc<dyn AssetSource>, cache: bool) -> Self {
        Self {
            source,
            cache,
            sets: DashMap::new(),
            tenants: RwLock::new(None),
        }
    }

    /// Template set for `host`, built at most once per scope while cached.
    pub fn build(&self, host: &str) -> Result<Arc<TemplateSet>, ViewError> {
        let scope = self.scope_for(host)?;

        if !self.cache {
            return self.build_uncached(&scope).map(Arc::new);
        }

        if let Some(set) = self.sets.get(&scope) {
            return Ok(set.clone());
        }

        // The vacant entry holds the shard lock, so concurrent callers for the
        // same scope wait for this build instead of racing it.
        match self.sets.entry(scope) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let set = Arc::new(self.build_uncached(entry.key())?);
                entry.insert(set.clone());
                Ok(set)
            }
        }
    }

    /// Render a page for `host`.
    pub fn render(
        &self,
        host: &str,
        name: &str,
        data: &Value,
        explicit: bool,
    ) -> Result<String, ViewError> {
        self.build(host)?.render(name, data, explicit)
    }

    /// Whether a page (or, when `explicit`, a view) exists for `host`.
    pub fn has_view(&self, host: &str, name: &str, explicit: bool) -> Result<bool, ViewError> {
        Ok(self.build(host)?.lookup(name, explicit).is_some())
    }

    /// Every routable page name across all host scopes.
    pub fn page_names(&self) -> Result<BTreeSet<String>, ViewError> {
        Ok(template_names(self.source.as_ref(), PAGES_NAMESPACE)?
            .into_iter()
            .map(|(_, name)| name)
            .collect())
    }

    /// Drop every cached set; the next request rebuilds.
    pub fn invalidate(&self) {
        self.sets.clear();
        *self.tenants.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("Template cache invalidated");
    }

    fn build_uncached(&self, scope: &str) -> Result<TemplateSet, ViewError> {
        metrics::record_template_build(scope);
        TemplateSet::build(self.source.as_ref(), scope).inspect_err(|e| {
            tracing::error!(host = %scope, error = %e, "Template set build failed");
        })
    }

    fn scope_for(&self, host: &str) -> Result<String, ViewError> {
        if host.is_empty() {
            return Ok(String::new());
        }
        let tenants = self.tenants()?;
        Ok(if tenants.contains(host) {
            host.to_string()
        } else {
            String::new()
        })
    }

    fn tenants(&self) -> Result<Arc<BTreeSet<String>>, ViewError> {
        if self.cache {
            let guard = self.tenants.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(tenants) = guard.as_ref() {
                return Ok(tenants.clone());
            }
        }

        let mut found = BTreeSet::new();
        for namespace in [PAGES_NAMESPACE, VIEWS_NAMESPACE, LAYOUTS_NAMESPACE, COMPONENTS_NAMESPACE] {
            for (scope, _) in template_names(self.source.as_ref(), namespace)? {
                if !scope.is_empty() {
                    found.insert(scope);
                }
            }
        }
        let found = Arc::new(found);

        if self.cache {
            *self.tenants.write().unwrap_or_else(PoisonError::into_inner) = Some(found.clone());
        }
        Ok(found)
    }
}
