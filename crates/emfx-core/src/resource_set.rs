//! Multi-document registry
//!
//! A `ResourceSet` maps locators to loaded resources and owns the
//! `ResourceLoader` used to fetch documents on demand when a proxy points
//! into a document that has not been loaded yet.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use emfx_core_types::Identifier;
use tokio::sync::Mutex;

use crate::errors::{ModelError, Result};
use crate::fragment;
use crate::proxy::UnresolvedReference;
use crate::resource::Resource;
use crate::{log_op_end, log_op_error, log_op_start};

/// Seam between the registry and a document parser
///
/// Implementations turn a locator into a fully built resource. They must not
/// register the result themselves; the set does that.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn load(&self, locator: &str, set: &ResourceSet) -> Result<Resource>;
}

struct Registry {
    resources: HashMap<String, Resource>,
    order: Vec<String>,
}

/// Registry of resources keyed by locator
///
/// Cloning shares the registry. A locator already present is never
/// reloaded.
#[derive(Clone)]
pub struct ResourceSet {
    registry: Arc<Mutex<Registry>>,
    loader: Option<Arc<dyn ResourceLoader>>,
}

impl ResourceSet {
    /// Registry without a loader; `load` only finds registered resources
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                resources: HashMap::new(),
                order: Vec::new(),
            })),
            loader: None,
        }
    }

    pub fn with_loader(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader: Some(loader),
            ..Self::new()
        }
    }

    /// Register and return a new empty resource
    ///
    /// If the locator is already registered the existing resource is
    /// returned unchanged.
    pub async fn create_resource(&self, locator: &str) -> Resource {
        let mut registry = self.registry.lock().await;
        if let Some(existing) = registry.resources.get(locator) {
            tracing::warn!(locator, "create_resource on registered locator returns existing resource");
            return existing.clone();
        }
        let resource = Resource::new(locator);
        registry.order.push(locator.to_string());
        registry
            .resources
            .insert(locator.to_string(), resource.clone());
        resource
    }

    /// Look up a resource without creating or loading it
    pub async fn resource(&self, locator: &str) -> Option<Resource> {
        self.registry.lock().await.resources.get(locator).cloned()
    }

    /// Register a resource built elsewhere; the first registration of a
    /// locator wins and is returned
    pub async fn register(&self, resource: Resource) -> Resource {
        let mut registry = self.registry.lock().await;
        let locator = resource.locator().to_string();
        if let Some(existing) = registry.resources.get(&locator) {
            return existing.clone();
        }
        registry.order.push(locator.clone());
        registry.resources.insert(locator, resource.clone());
        resource
    }

    /// Registered locators in registration order
    pub async fn locators(&self) -> Vec<String> {
        self.registry.lock().await.order.clone()
    }

    /// Registered resources in registration order
    pub async fn resources(&self) -> Vec<Resource> {
        let registry = self.registry.lock().await;
        registry
            .order
            .iter()
            .filter_map(|l| registry.resources.get(l).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.resources.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get a registered resource or load it through the loader
    ///
    /// The registry lock is not held while the loader runs, so the loader
    /// may call back into this set. If two callers race on the same
    /// locator, the first registration wins and both get it.
    ///
    /// # Errors
    ///
    /// `NoLoader` if the locator is unknown and no loader is configured;
    /// any error raised by the loader.
    pub async fn load(&self, locator: &str) -> Result<Resource> {
        if let Some(existing) = self.resource(locator).await {
            return Ok(existing);
        }
        let loader = self.loader.as_ref().ok_or_else(|| ModelError::NoLoader {
            locator: locator.to_string(),
        })?;
        let loaded = loader.load(locator, self).await?;
        Ok(self.register(loaded).await)
    }

    /// Dereference a proxy: find or load its document, then resolve the
    /// fragment inside it
    ///
    /// Idempotent; the outcome is memoized in the proxy (shared by its
    /// clones). `Ok(None)` means the document loaded but the fragment
    /// matched nothing.
    ///
    /// # Errors
    ///
    /// Errors from loading the target document. They are not memoized, so a
    /// later call retries.
    pub async fn resolve(&self, proxy: &UnresolvedReference) -> Result<Option<Identifier>> {
        if let Some(target) = proxy.memo().get() {
            return Ok(*target);
        }

        let start = Instant::now();
        log_op_start!("resolve_proxy", locator = proxy.locator(), fragment = proxy.fragment());

        let outcome = proxy
            .memo()
            .get_or_try_init(|| async {
                let resource = self.load(proxy.locator()).await?;
                let contents = resource.read().await;
                Ok::<_, ModelError>(fragment::resolve_fragment(&*contents, None, proxy.fragment()))
            })
            .await;

        match outcome {
            Ok(target) => {
                log_op_end!(
                    "resolve_proxy",
                    duration_ms = start.elapsed().as_millis() as u64,
                    locator = proxy.locator(),
                    found = target.is_some()
                );
                Ok(*target)
            }
            Err(err) => {
                log_op_error!(
                    "resolve_proxy",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    locator = proxy.locator()
                );
                Err(err)
            }
        }
    }

    /// Find the registered resource whose table holds an object
    pub async fn locate(&self, id: &Identifier) -> Option<Resource> {
        for resource in self.resources().await {
            if resource.read().await.contains(id) {
                return Some(resource);
            }
        }
        None
    }
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::EObject;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader that builds a one-object resource and counts calls
    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResourceLoader for CountingLoader {
        async fn load(&self, locator: &str, _set: &ResourceSet) -> Result<Resource> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if locator.ends_with("missing.xmi") {
                return Err(ModelError::Io {
                    locator: locator.to_string(),
                    message: "not found".to_string(),
                });
            }
            let resource = Resource::new(locator);
            {
                let mut contents = resource.write().await;
                let class = contents.metamodel_mut().get_or_create_classifier("Thing", None);
                contents.add(EObject::new(class));
            }
            Ok(resource)
        }
    }

    fn counting_set() -> (ResourceSet, Arc<CountingLoader>) {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
        });
        (ResourceSet::with_loader(loader.clone()), loader)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let set = ResourceSet::new();
        let created = set.create_resource("mem:a").await;
        let found = set.resource("mem:a").await.unwrap();
        assert!(created.ptr_eq(&found));
        assert!(set.resource("mem:b").await.is_none());
        assert_eq!(set.locators().await, vec!["mem:a".to_string()]);
    }

    #[tokio::test]
    async fn test_create_on_existing_locator_returns_existing() {
        let set = ResourceSet::new();
        let first = set.create_resource("mem:a").await;
        let second = set.create_resource("mem:a").await;
        assert!(first.ptr_eq(&second));
        assert_eq!(set.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_without_loader_fails() {
        let set = ResourceSet::new();
        let err = set.load("/x.xmi").await.unwrap_err();
        assert!(matches!(err, ModelError::NoLoader { .. }));
    }

    #[tokio::test]
    async fn test_loaded_locator_is_never_reloaded() {
        let (set, loader) = counting_set();
        let a = set.load("/m/a.xmi").await.unwrap();
        let b = set.load("/m/a.xmi").await.unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_memoized() {
        let (set, loader) = counting_set();
        let proxy = UnresolvedReference::new("/m/a.xmi", "/");
        let first = set.resolve(&proxy).await.unwrap();
        let second = set.resolve(&proxy.clone()).await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(proxy.is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_dangling_fragment_is_none() {
        let (set, _) = counting_set();
        let proxy = UnresolvedReference::new("/m/a.xmi", "//@nothing.4");
        assert_eq!(set.resolve(&proxy).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_load_error_propagates_and_is_not_memoized() {
        let (set, loader) = counting_set();
        let proxy = UnresolvedReference::new("/m/missing.xmi", "/");
        assert!(set.resolve(&proxy).await.is_err());
        assert!(!proxy.is_resolved());
        assert!(set.resolve(&proxy).await.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert!(set.resource("/m/missing.xmi").await.is_none());
    }

    #[tokio::test]
    async fn test_locate_finds_owning_resource() {
        let (set, _) = counting_set();
        let a = set.load("/m/a.xmi").await.unwrap();
        let root = a.root_objects().await[0].id();
        let located = set.locate(&root).await.unwrap();
        assert!(located.ptr_eq(&a));
        assert!(set.locate(&Identifier::new()).await.is_none());
    }
}
