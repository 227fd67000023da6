//! Reserved ownership labels.

use std::collections::BTreeMap;

use crate::model::{BackendIdentity, LabelSelector};
use crate::translator::name::shorten_label_value;

/// Label naming the backend instance a mirrored object came from.
pub const BACKEND_LABEL: &str = "discovery-sync.io/backend";

/// Label carrying the upstream resource name, pre-translation.
pub const SERVICE_LABEL: &str = "discovery-sync.io/service";

/// Overlays the reserved ownership labels onto an upstream label set.
/// Pre-existing values under the reserved keys are overwritten; everything
/// else passes through. Values are bounded like names.
pub fn build_labels(
    backend_name: &str,
    upstream_name: &str,
    existing: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut labels = existing;
    labels.insert(BACKEND_LABEL.to_string(), shorten_label_value(backend_name));
    labels.insert(SERVICE_LABEL.to_string(), shorten_label_value(upstream_name));
    labels
}

/// Selector scoping "current state" queries to one backend's objects.
pub fn ownership_selector(backend: &BackendIdentity) -> LabelSelector {
    LabelSelector::new(BACKEND_LABEL, shorten_label_value(&backend.name))
}
