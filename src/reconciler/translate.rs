//! Shaping upstream load balancers into mirrored records.

use std::collections::BTreeMap;

use crate::backends::{UpstreamListener, UpstreamLoadBalancer};
use crate::model::{
    BackendIdentity, EndpointRecord, EndpointSubset, PortSpec, Protocol, ServiceRecord,
};
use crate::translator;

/// Builds the service record mirroring one upstream load balancer.
pub fn service_for(
    backend: &BackendIdentity,
    partition: &str,
    lb: &UpstreamLoadBalancer,
) -> ServiceRecord {
    ServiceRecord {
        namespace: partition.to_string(),
        name: translator::build_name(&backend.name, &lb.name),
        labels: translator::build_labels(&backend.name, &lb.name, lb.labels.clone()),
        ports: lb.listeners.iter().map(service_port).collect(),
        resource_version: None,
    }
}

/// Builds the endpoints record mirroring one upstream load balancer.
/// Members sharing a listening port collapse into one subset. Subsets are
/// ordered by port within each listener, so successive cycles produce
/// identical records and the diff engine sees no spurious updates.
pub fn endpoints_for(
    backend: &BackendIdentity,
    partition: &str,
    lb: &UpstreamLoadBalancer,
) -> EndpointRecord {
    let mut subsets = Vec::new();
    for listener in &lb.listeners {
        let mut by_port: BTreeMap<u16, EndpointSubset> = BTreeMap::new();
        for member in &listener.members {
            let subset = by_port.entry(member.port).or_insert_with(|| EndpointSubset {
                addresses: Vec::new(),
                ports: vec![PortSpec {
                    name: port_name(listener),
                    port: member.port,
                    protocol: Protocol::Tcp,
                }],
            });
            subset.addresses.push(member.address.clone());
        }
        subsets.extend(by_port.into_values());
    }

    EndpointRecord {
        namespace: partition.to_string(),
        name: translator::build_name(&backend.name, &lb.name),
        labels: translator::build_labels(&backend.name, &lb.name, lb.labels.clone()),
        subsets,
        resource_version: None,
    }
}

fn service_port(listener: &UpstreamListener) -> PortSpec {
    PortSpec {
        name: port_name(listener),
        port: listener.port,
        protocol: Protocol::Tcp,
    }
}

/// Port names must be valid identifiers with at least one character, so
/// anonymous listeners get a name derived from their port.
fn port_name(listener: &UpstreamListener) -> String {
    let port = listener.port.to_string();
    if listener.name.is_empty() {
        return format!("unnamed-{port}");
    }
    translator::name::bounded_join(&[&listener.name, &port])
}
