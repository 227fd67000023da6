//! Config-file-driven backend adapter.
//!
//! Serves the inventory section of the config file as a backend, which
//! lets the daemon run end-to-end without any remote system. Also the
//! lister used by the integration tests.

use async_trait::async_trait;

use crate::backends::{
    BackendLister, ListError, UpstreamListener, UpstreamLoadBalancer, UpstreamMember,
};
use crate::config::{InventoryConfig, PartitionConfig};

#[derive(Debug, Default)]
pub struct StaticInventory {
    partitions: Vec<PartitionConfig>,
}

impl StaticInventory {
    pub fn from_config(inventory: InventoryConfig) -> Self {
        Self {
            partitions: inventory.partitions,
        }
    }
}

impl From<&PartitionConfig> for Vec<UpstreamLoadBalancer> {
    fn from(partition: &PartitionConfig) -> Self {
        partition
            .load_balancers
            .iter()
            .map(|lb| UpstreamLoadBalancer {
                name: lb.name.clone(),
                labels: lb.labels.clone(),
                listeners: lb
                    .listeners
                    .iter()
                    .map(|listener| UpstreamListener {
                        name: listener.name.clone(),
                        port: listener.port,
                        members: listener
                            .members
                            .iter()
                            .map(|member| UpstreamMember {
                                address: member.address.clone(),
                                port: member.port,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[async_trait]
impl BackendLister for StaticInventory {
    async fn list_partitions(&self) -> Result<Vec<String>, ListError> {
        Ok(self.partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn list_load_balancers(
        &self,
        partition: &str,
    ) -> Result<Vec<UpstreamLoadBalancer>, ListError> {
        self.partitions
            .iter()
            .find(|p| p.name == partition)
            .map(Vec::from)
            .ok_or_else(|| ListError::Api(format!("unknown partition {partition}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ListenerConfig, LoadBalancerConfig, MemberConfig};

    fn inventory() -> InventoryConfig {
        InventoryConfig {
            partitions: vec![PartitionConfig {
                name: "finance".into(),
                load_balancers: vec![LoadBalancerConfig {
                    name: "prod".into(),
                    labels: Default::default(),
                    listeners: vec![ListenerConfig {
                        name: "http".into(),
                        port: 80,
                        members: vec![MemberConfig {
                            address: "10.0.0.1".into(),
                            port: 8080,
                        }],
                    }],
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_lists_partitions_and_load_balancers() {
        let lister = StaticInventory::from_config(inventory());
        assert_eq!(lister.list_partitions().await.unwrap(), vec!["finance"]);

        let lbs = lister.list_load_balancers("finance").await.unwrap();
        assert_eq!(lbs.len(), 1);
        assert_eq!(lbs[0].listeners[0].members[0].address, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_unknown_partition_errors() {
        let lister = StaticInventory::from_config(InventoryConfig::default());
        assert!(lister.list_load_balancers("ghost").await.is_err());
    }
}
