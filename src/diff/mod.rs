//! Diff engine: desired vs. current object sets.
//!
//! Pure and idempotent. Matching is by identity only; content comparison
//! never moves an object between the add/delete buckets. Both inputs may
//! arrive in any order — lookups are identity-keyed, so permuting either
//! list never changes which bucket an object lands in.

use std::collections::HashMap;

use crate::model::{Mirrored, ObjectKey};

/// The change set for one object kind, recomputed from scratch every cycle.
#[derive(Debug, Clone)]
pub struct DiffResult<T> {
    pub add: Vec<T>,
    pub update: Vec<T>,
    pub delete: Vec<T>,
}

impl<T> DiffResult<T> {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.add.len() + self.update.len() + self.delete.len()
    }
}

/// Computes the minimal change set turning `current` into `desired`.
///
/// - present only in `current` → delete
/// - present only in `desired` → add
/// - present in both with differing content → update, carrying the
///   *desired* object's full content
pub fn diff<T: Mirrored>(desired: &[T], current: &[T]) -> DiffResult<T> {
    let desired_by_key: HashMap<ObjectKey, &T> =
        desired.iter().map(|o| (o.key(), o)).collect();
    let current_by_key: HashMap<ObjectKey, &T> =
        current.iter().map(|o| (o.key(), o)).collect();

    let delete = current
        .iter()
        .filter(|o| !desired_by_key.contains_key(&o.key()))
        .cloned()
        .collect();

    let mut add = Vec::new();
    let mut update = Vec::new();
    for obj in desired {
        match current_by_key.get(&obj.key()) {
            None => add.push(obj.clone()),
            Some(existing) if !existing.same_spec(obj) => update.push(obj.clone()),
            Some(_) => {}
        }
    }

    DiffResult { add, update, delete }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{PortSpec, Protocol, ServiceRecord};

    fn svc(name: &str, port: u16) -> ServiceRecord {
        ServiceRecord {
            namespace: "finance".into(),
            name: name.into(),
            labels: BTreeMap::new(),
            ports: vec![PortSpec {
                name: "http".into(),
                port,
                protocol: Protocol::Tcp,
            }],
            resource_version: None,
        }
    }

    #[test]
    fn test_disjoint_sets() {
        let desired = vec![svc("a", 80), svc("b", 80)];
        let current = vec![svc("c", 80), svc("d", 80)];
        let result = diff(&desired, &current);
        assert_eq!(result.add.len(), 2);
        assert_eq!(result.delete.len(), 2);
        assert!(result.update.is_empty());
    }

    #[test]
    fn test_identical_sets_are_a_noop() {
        let desired = vec![svc("a", 80), svc("b", 8080)];
        let current = desired.clone();
        let result = diff(&desired, &current);
        assert!(result.is_empty());
    }

    #[test]
    fn test_changed_content_updates_once_with_desired() {
        let desired = vec![svc("a", 8080)];
        let current = vec![svc("a", 80)];
        let result = diff(&desired, &current);
        assert!(result.add.is_empty());
        assert!(result.delete.is_empty());
        assert_eq!(result.update.len(), 1);
        assert_eq!(result.update[0].ports[0].port, 8080);
    }

    #[test]
    fn test_resource_version_does_not_trigger_update() {
        let desired = vec![svc("a", 80)];
        let mut existing = svc("a", 80);
        existing.resource_version = Some("7".into());
        let result = diff(&desired, &[existing]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_invariant_under_permutation() {
        let desired = vec![svc("a", 80), svc("b", 8080), svc("c", 443)];
        let current = vec![svc("b", 9090), svc("d", 80), svc("a", 80)];

        let baseline = diff(&desired, &current);

        let mut desired_rev = desired.clone();
        desired_rev.reverse();
        let mut current_rev = current.clone();
        current_rev.reverse();
        let permuted = diff(&desired_rev, &current_rev);

        let names = |v: &[ServiceRecord]| {
            let mut n: Vec<String> = v.iter().map(|s| s.name.clone()).collect();
            n.sort();
            n
        };
        assert_eq!(names(&baseline.add), names(&permuted.add));
        assert_eq!(names(&baseline.update), names(&permuted.update));
        assert_eq!(names(&baseline.delete), names(&permuted.delete));

        assert_eq!(names(&baseline.add), vec!["c"]);
        assert_eq!(names(&baseline.update), vec!["b"]);
        assert_eq!(names(&baseline.delete), vec!["d"]);
    }

    #[test]
    fn test_idempotent() {
        let desired = vec![svc("a", 80), svc("b", 8080)];
        let current = vec![svc("b", 80), svc("c", 443)];
        let first = diff(&desired, &current);
        let second = diff(&desired, &current);
        assert_eq!(first.add, second.add);
        assert_eq!(first.update, second.update);
        assert_eq!(first.delete, second.delete);
    }
}
