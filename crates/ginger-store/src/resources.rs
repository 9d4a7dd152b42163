//! Path-keyed resource tree

use crate::error::{Result, StoreError};
use ginger_types::path;
use ginger_types::{RemoteId, Resource};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// In-memory resource tree, keyed by normalized path.
///
/// Kept as a flat list so the on-disk order (and `sort_by_depth`'s
/// stability) is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceStore {
    resources: Vec<Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, normalizing every path and rejecting duplicates
    pub fn from_resources(resources: Vec<Resource>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(resources.len());
        for mut resource in resources {
            resource.path = path::normalize(&resource.path);
            if !seen.insert(resource.path.clone()) {
                return Err(StoreError::DuplicateResource(resource.path));
            }
            normalized.push(resource);
        }
        Ok(Self {
            resources: normalized,
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = path::normalize(path);
        self.resources.iter().any(|r| r.path == path)
    }

    pub fn find(&self, path: &str) -> Result<&Resource> {
        let path = path::normalize(path);
        self.resources
            .iter()
            .find(|r| r.path == path)
            .ok_or(StoreError::ResourceNotFound(path))
    }

    pub fn find_mut(&mut self, path: &str) -> Result<&mut Resource> {
        let path = path::normalize(path);
        self.resources
            .iter_mut()
            .find(|r| r.path == path)
            .ok_or(StoreError::ResourceNotFound(path))
    }

    /// Remote id recorded for a path, if any
    pub fn remote_id(&self, path: &str) -> Option<&RemoteId> {
        self.find(path).ok().and_then(|r| r.remote_id.as_ref())
    }

    /// Add a resource; the path must not already be present
    pub fn insert(&mut self, mut resource: Resource) -> Result<&mut Resource> {
        resource.path = path::normalize(&resource.path);
        if self.contains(&resource.path) {
            return Err(StoreError::ResourceExists(resource.path));
        }
        self.resources.push(resource);
        let last = self.resources.len() - 1;
        Ok(&mut self.resources[last])
    }

    /// Record a remote id for `path`, adding a discovered resource if the
    /// path is unknown locally
    pub fn record_remote_id(&mut self, path: &str, remote_id: RemoteId) {
        match self.find_mut(path) {
            Ok(resource) => resource.remote_id = Some(remote_id),
            Err(_) => self.resources.push(Resource::discovered(path, remote_id)),
        }
    }

    /// Every resource whose normalized path starts with `prefix`
    pub fn find_subtree(&self, prefix: &str) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| path::has_prefix(&r.path, prefix))
            .collect()
    }

    /// Remove exactly the resource at `path`
    pub fn delete(&mut self, path: &str) -> Result<Resource> {
        let path = path::normalize(path);
        let index = self
            .resources
            .iter()
            .position(|r| r.path == path)
            .ok_or_else(|| StoreError::ResourceNotFound(path.clone()))?;
        Ok(self.resources.remove(index))
    }

    /// Stable sort ascending by segment count, so parents precede children
    pub fn sort_by_depth(&mut self) {
        self.resources.sort_by_key(Resource::depth);
    }

    /// Paths in depth order without mutating the store
    pub fn paths_by_depth(&self) -> Vec<String> {
        let mut paths: Vec<&Resource> = self.resources.iter().collect();
        paths.sort_by_key(|r| r.depth());
        paths.into_iter().map(|r| r.path.clone()).collect()
    }

    /// Forget every remote id, e.g. after the routing container was replaced
    pub fn clear_remote_ids(&mut self) {
        for resource in &mut self.resources {
            resource.remote_id = None;
            for integration in resource.integrations.values_mut() {
                if let ginger_types::Integration::Function {
                    proxy_resource_id, ..
                } = integration
                {
                    *proxy_resource_id = None;
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for ResourceStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let resources = Vec::<Resource>::deserialize(deserializer)?;
        ResourceStore::from_resources(resources).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(paths: &[&str]) -> ResourceStore {
        ResourceStore::from_resources(paths.iter().map(|p| Resource::new(p)).collect()).unwrap()
    }

    #[test]
    fn test_find_normalizes() {
        let store = store(&["/users/", "orders"]);
        assert_eq!(store.find("users").unwrap().path, "/users");
        assert_eq!(store.find("/orders/").unwrap().path, "/orders");
        assert!(matches!(
            store.find("/missing"),
            Err(StoreError::ResourceNotFound(p)) if p == "/missing"
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = ResourceStore::from_resources(vec![Resource::new("/a"), Resource::new("a/")]);
        assert!(matches!(result, Err(StoreError::DuplicateResource(p)) if p == "/a"));

        let mut store = store(&["/a"]);
        assert!(matches!(
            store.insert(Resource::new("/a/")),
            Err(StoreError::ResourceExists(_))
        ));
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut store = store(&["/a", "/a/b"]);
        let removed = store.delete("/a").unwrap();
        assert_eq!(removed.path, "/a");
        assert!(store.contains("/a/b"));
        assert!(matches!(store.delete("/a"), Err(StoreError::ResourceNotFound(_))));
    }

    #[test]
    fn test_find_subtree_is_prefix_match() {
        let store = store(&["/", "/a", "/a/b", "/ab", "/b"]);
        let mut found: Vec<&str> = store
            .find_subtree("a")
            .into_iter()
            .map(|r| r.path.as_str())
            .collect();
        found.sort();
        assert_eq!(found, vec!["/a", "/a/b", "/ab"]);
        assert_eq!(store.find_subtree("/").len(), 5);
    }

    #[test]
    fn test_sort_by_depth_is_stable() {
        let mut store = store(&["/a/b", "/z", "/", "/a", "/y/x"]);
        store.sort_by_depth();
        let order: Vec<&str> = store.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(order, vec!["/", "/z", "/a", "/a/b", "/y/x"]);
    }

    #[test]
    fn test_record_remote_id_adds_discovered() {
        let mut store = store(&["/a"]);
        store.record_remote_id("/a", RemoteId::new("r-a"));
        store.record_remote_id("/", RemoteId::new("r-root"));
        assert_eq!(store.remote_id("/a"), Some(&RemoteId::new("r-a")));
        let root = store.find("/").unwrap();
        assert!(!root.user_defined);
        assert_eq!(root.remote_id, Some(RemoteId::new("r-root")));
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(prop_oneof![Just("a"), Just("b"), Just("ab")], 0..4)
            .prop_map(|segs| format!("/{}", segs.join("/")))
    }

    proptest! {
        #[test]
        fn property_subtree_delete_removes_exact_prefix_set(
            paths in proptest::collection::btree_set(path_strategy(), 0..12),
            target in path_strategy(),
        ) {
            let mut store = ResourceStore::from_resources(
                paths.iter().map(|p| Resource::new(p)).collect(),
            ).unwrap();
            let prefix = path::normalize(&target);

            let doomed: Vec<String> = store
                .find_subtree(&prefix)
                .into_iter()
                .map(|r| r.path.clone())
                .collect();
            for p in &doomed {
                store.delete(p).unwrap();
            }

            for p in &paths {
                let normalized = path::normalize(p);
                prop_assert_eq!(store.contains(&normalized), !normalized.starts_with(&prefix));
            }
        }

        #[test]
        fn property_sort_by_depth_puts_parents_first(
            paths in proptest::collection::btree_set(path_strategy(), 0..12),
        ) {
            let mut store = ResourceStore::from_resources(
                paths.iter().map(|p| Resource::new(p)).collect(),
            ).unwrap();
            store.sort_by_depth();
            let order: Vec<String> = store.iter().map(|r| r.path.clone()).collect();
            for (i, p) in order.iter().enumerate() {
                if let Some(parent) = path::parent(p) {
                    if let Some(j) = order.iter().position(|q| *q == parent) {
                        prop_assert!(j < i);
                    }
                }
            }
        }
    }
}
