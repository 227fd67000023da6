//! In-process target cluster.
//!
//! Backs the demo wiring and every test. Assigns monotonically increasing
//! resource versions on create and on each accepted patch, the same
//! contract a real API server provides.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cluster::{patch, ClusterClient, ClusterError};
use crate::model::{
    EndpointRecord, LabelSelector, Mirrored, MirroredObject, ObjectKey, ServiceRecord,
};

#[derive(Debug, Default)]
pub struct MemoryCluster {
    services: DashMap<ObjectKey, ServiceRecord>,
    endpoints: DashMap<ObjectKey, EndpointRecord>,
    version: AtomicU64,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Full mirrored-state snapshot, for the status endpoint.
    pub fn snapshot(&self) -> Vec<MirroredObject> {
        let mut objects: Vec<MirroredObject> = self
            .services
            .iter()
            .map(|e| MirroredObject::Service(e.value().clone()))
            .chain(
                self.endpoints
                    .iter()
                    .map(|e| MirroredObject::Endpoints(e.value().clone())),
            )
            .collect();
        objects.sort_by_key(|o| (o.kind(), o.key()));
        objects
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn endpoints_count(&self) -> usize {
        self.endpoints.len()
    }

    fn patch_record<T>(
        map: &DashMap<ObjectKey, T>,
        key: &ObjectKey,
        patch_value: serde_json::Value,
        version: String,
    ) -> Result<(), ClusterError>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let mut entry = map
            .get_mut(key)
            .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
        let mut doc = serde_json::to_value(entry.value())?;
        patch::apply_merge(&mut doc, &patch_value);
        if let Some(fields) = doc.as_object_mut() {
            fields.insert("resource_version".to_string(), version.into());
        }
        *entry.value_mut() = serde_json::from_value(doc)?;
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<ServiceRecord>, ClusterError> {
        let mut out: Vec<ServiceRecord> = self
            .services
            .iter()
            .filter(|e| e.key().namespace == namespace && selector.matches(&e.value().labels))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|s| s.key());
        Ok(out)
    }

    async fn get_service(&self, key: &ObjectKey) -> Result<ServiceRecord, ClusterError> {
        self.services
            .get(key)
            .map(|e| e.value().clone())
            .ok_or_else(|| ClusterError::NotFound(key.clone()))
    }

    async fn create_service(&self, service: &ServiceRecord) -> Result<(), ClusterError> {
        let key = service.key();
        match self.services.entry(key.clone()) {
            Entry::Occupied(_) => Err(ClusterError::AlreadyExists(key)),
            Entry::Vacant(slot) => {
                let mut stored = service.clone();
                stored.resource_version = Some(self.next_version());
                slot.insert(stored);
                Ok(())
            }
        }
    }

    async fn patch_service(
        &self,
        key: &ObjectKey,
        patch_value: serde_json::Value,
    ) -> Result<(), ClusterError> {
        Self::patch_record(&self.services, key, patch_value, self.next_version())
    }

    async fn delete_service(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.services
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound(key.clone()))
    }

    async fn list_endpoints(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<EndpointRecord>, ClusterError> {
        let mut out: Vec<EndpointRecord> = self
            .endpoints
            .iter()
            .filter(|e| e.key().namespace == namespace && selector.matches(&e.value().labels))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|e| e.key());
        Ok(out)
    }

    async fn get_endpoints(&self, key: &ObjectKey) -> Result<EndpointRecord, ClusterError> {
        self.endpoints
            .get(key)
            .map(|e| e.value().clone())
            .ok_or_else(|| ClusterError::NotFound(key.clone()))
    }

    async fn create_endpoints(&self, endpoints: &EndpointRecord) -> Result<(), ClusterError> {
        let key = endpoints.key();
        match self.endpoints.entry(key.clone()) {
            Entry::Occupied(_) => Err(ClusterError::AlreadyExists(key)),
            Entry::Vacant(slot) => {
                let mut stored = endpoints.clone();
                stored.resource_version = Some(self.next_version());
                slot.insert(stored);
                Ok(())
            }
        }
    }

    async fn patch_endpoints(
        &self,
        key: &ObjectKey,
        patch_value: serde_json::Value,
    ) -> Result<(), ClusterError> {
        Self::patch_record(&self.endpoints, key, patch_value, self.next_version())
    }

    async fn delete_endpoints(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.endpoints
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound(key.clone()))
    }
}
