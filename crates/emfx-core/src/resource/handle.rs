use std::sync::Arc;
use std::time::Instant;

use emfx_core_types::Identifier;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::contents::ResourceContents;
use crate::errors::Result;
use crate::fragment;
use crate::object::EObject;
use crate::proxy::{ProxyState, UnresolvedReference};
use crate::resource_set::ResourceSet;
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

/// Shared handle to one loaded document
///
/// Cloning the handle shares the same contents. Writes are serialized by an
/// async read/write lock: one mutation in flight at a time, and a completed
/// write is visible to every later read through any clone.
#[derive(Clone)]
pub struct Resource {
    locator: Arc<str>,
    inner: Arc<RwLock<ResourceContents>>,
}

impl Resource {
    /// Create an empty resource
    pub fn new(locator: impl Into<String>) -> Self {
        Self::from_contents(ResourceContents::new(locator))
    }

    /// Publish a fully built object table
    pub fn from_contents(contents: ResourceContents) -> Self {
        Self {
            locator: Arc::from(contents.locator()),
            inner: Arc::new(RwLock::new(contents)),
        }
    }

    /// Origin locator of the document
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// True when both handles share the same contents
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Shared read access for bulk inspection
    pub async fn read(&self) -> RwLockReadGuard<'_, ResourceContents> {
        self.inner.read().await
    }

    /// Exclusive write access for bulk mutation
    pub async fn write(&self) -> RwLockWriteGuard<'_, ResourceContents> {
        self.inner.write().await
    }

    /// Register an object as both a root and a table entry
    pub async fn add(&self, object: EObject) -> Identifier {
        self.inner.write().await.add(object)
    }

    /// Register an object in the table only
    pub async fn register(&self, object: EObject) -> Identifier {
        self.inner.write().await.register(object)
    }

    pub async fn root_objects(&self) -> Vec<EObject> {
        self.inner.read().await.roots().cloned().collect()
    }

    /// Every object in table (insertion) order
    pub async fn all_objects(&self) -> Vec<EObject> {
        self.inner.read().await.objects().cloned().collect()
    }

    pub async fn object(&self, id: &Identifier) -> Option<EObject> {
        self.inner.read().await.object(id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.count()
    }

    /// Read a feature by name
    pub async fn e_get(&self, id: &Identifier, feature_name: &str) -> Option<Value> {
        self.inner.read().await.e_get(id, feature_name).cloned()
    }

    /// Write a feature by name; `None` unsets it
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` if the id is not in this resource.
    pub async fn e_set(&self, id: &Identifier, feature_name: &str, value: Option<Value>) -> Result<()> {
        self.inner.write().await.e_set(id, feature_name, value)
    }

    pub async fn container_of(&self, id: &Identifier) -> Option<Identifier> {
        self.inner.read().await.container_of(id).map(|(parent, _, _)| parent)
    }

    pub async fn fragment_of(&self, id: &Identifier) -> Option<String> {
        self.inner.read().await.fragment_of(id)
    }

    /// Resolve a same-document fragment against this resource
    pub async fn resolve_fragment(&self, fragment: &str) -> Option<Identifier> {
        let contents = self.inner.read().await;
        fragment::resolve_fragment(&*contents, None, fragment)
    }

    /// Dereference every proxy held by this resource and replace the
    /// resolved ones with plain object references
    ///
    /// Returns the number of values replaced. Dangling proxies stay in
    /// place. Load failures of target documents propagate; this resource is
    /// left unchanged in that case.
    ///
    /// # Errors
    ///
    /// Any error raised while loading a target document.
    pub async fn resolve_all(&self, set: &ResourceSet) -> Result<usize> {
        let start = Instant::now();
        log_op_start!("resolve_all", locator = %self.locator);

        let proxies: Vec<UnresolvedReference> = {
            let contents = self.inner.read().await;
            let mut found = Vec::new();
            for object in contents.objects() {
                for feature_id in object.set_features() {
                    if let Some(value) = object.get_by_id(feature_id) {
                        collect_proxies(value, &mut found);
                    }
                }
            }
            found
        };

        for proxy in &proxies {
            if let Err(err) = set.resolve(proxy).await {
                log_op_error!(
                    "resolve_all",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    locator = %self.locator
                );
                return Err(err);
            }
        }

        let mut replaced = 0usize;
        {
            let mut contents = self.inner.write().await;
            let ids: Vec<Identifier> = contents.object_ids().to_vec();
            for id in ids {
                if let Some(object) = contents.object_mut(&id) {
                    for value in object.values_mut() {
                        replaced += swap_resolved(value);
                    }
                }
            }
        }

        log_op_end!(
            "resolve_all",
            duration_ms = start.elapsed().as_millis() as u64,
            locator = %self.locator,
            resolved = replaced
        );
        Ok(replaced)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

fn collect_proxies(value: &Value, out: &mut Vec<UnresolvedReference>) {
    match value {
        Value::Proxy(proxy) => out.push(proxy.clone()),
        Value::Many(items) => items.iter().for_each(|v| collect_proxies(v, out)),
        _ => {}
    }
}

fn swap_resolved(value: &mut Value) -> usize {
    let target = match value {
        Value::Proxy(proxy) => match proxy.state() {
            ProxyState::Resolved(Some(id)) => id,
            _ => return 0,
        },
        Value::Many(items) => return items.iter_mut().map(swap_resolved).sum(),
        _ => return 0,
    };
    *value = Value::Object(target);
    1
}
