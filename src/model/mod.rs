//! Data model for mirrored objects.
//!
//! # Data Flow
//! ```text
//! Backend lister output (upstream model, backends::*)
//!     → reconciler::translate (shaping + name translation)
//!     → ServiceRecord / EndpointRecord
//!     → diff engine (identity + content comparison via Mirrored)
//!     → sync queue (MirroredObject inside an Action)
//!     → cluster client (serialized for merge patching)
//! ```
//!
//! Identity is always (namespace, name). Content equality is kind-specific
//! and never affects identity matching.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an object inside the target cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Names the backend instance a mirrored object came from.
///
/// Immutable for the process lifetime; stamped onto every mirrored object
/// through the reserved ownership labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendIdentity {
    /// Unique backend instance name (a valid DNS label).
    pub name: String,
    /// Backend type tag (e.g. "kubernetes", "openstack", "static").
    pub backend_type: String,
}

impl BackendIdentity {
    pub fn new(name: impl Into<String>, backend_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend_type: backend_type.into(),
        }
    }
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.backend_type)
    }
}

/// Transport protocol of a named port. Only TCP is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Tcp
    }
}

/// A named port on a service or endpoint subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

/// Service-kind mirrored object: a set of named ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<PortSpec>,
    /// Server-assigned; never set by the reconciler, preserved on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// One group of addresses sharing a set of named ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSubset {
    pub addresses: Vec<String>,
    pub ports: Vec<PortSpec>,
}

/// Endpoints-kind mirrored object: the subsets backing a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub subsets: Vec<EndpointSubset>,
    /// Server-assigned; never set by the reconciler, preserved on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Identity and content comparison used by the diff engine.
///
/// `same_spec` compares mutable content only: two objects with equal keys
/// but different resource versions or labels still count as equal when
/// their kind-specific content matches.
pub trait Mirrored: Clone {
    fn key(&self) -> ObjectKey;
    fn same_spec(&self, other: &Self) -> bool;
}

impl Mirrored for ServiceRecord {
    fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    fn same_spec(&self, other: &Self) -> bool {
        self.ports == other.ports
    }
}

impl Mirrored for EndpointRecord {
    fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    fn same_spec(&self, other: &Self) -> bool {
        self.subsets == other.subsets
    }
}

/// The two concrete kinds being synchronized, as a closed sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MirroredObject {
    Service(ServiceRecord),
    Endpoints(EndpointRecord),
}

impl MirroredObject {
    pub fn key(&self) -> ObjectKey {
        match self {
            MirroredObject::Service(s) => s.key(),
            MirroredObject::Endpoints(e) => e.key(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MirroredObject::Service(_) => "service",
            MirroredObject::Endpoints(_) => "endpoints",
        }
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        match self {
            MirroredObject::Service(s) => &s.labels,
            MirroredObject::Endpoints(e) => &e.labels,
        }
    }
}

/// Single key=value label filter used when listing the target cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    pub key: String,
    pub value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|v| *v == self.value)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(ns: &str, name: &str, ports: Vec<PortSpec>) -> ServiceRecord {
        ServiceRecord {
            namespace: ns.into(),
            name: name.into(),
            labels: BTreeMap::new(),
            ports,
            resource_version: None,
        }
    }

    #[test]
    fn test_same_spec_ignores_metadata() {
        let a = svc(
            "finance",
            "prod",
            vec![PortSpec {
                name: "http".into(),
                port: 80,
                protocol: Protocol::Tcp,
            }],
        );
        let mut b = a.clone();
        b.resource_version = Some("42".into());
        b.labels.insert("team".into(), "payments".into());
        assert!(a.same_spec(&b));

        b.ports[0].port = 8080;
        assert!(!a.same_spec(&b));
    }

    #[test]
    fn test_selector_matches() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "web".to_string());
        let sel = LabelSelector::new("app", "web");
        assert!(sel.matches(&labels));
        assert!(!LabelSelector::new("app", "db").matches(&labels));
        assert!(!LabelSelector::new("tier", "web").matches(&labels));
    }
}
