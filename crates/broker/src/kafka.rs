//! KafkaTransport - real broker connection
//!
//! Records carry no key and are spread over a random partition of the topic.
//! Every produce request waits for acknowledgement from all in-sync replicas.
//! A topic missing from the cluster metadata fails the attempt instead of
//! waiting for the topic to appear.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use contracts::{BrokerTransport, ContractError};
use rand::Rng;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder};
use rskafka::record::Record;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Bound on the initial broker handshake and metadata fetch
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaTransport {
    name: String,
    client: Client,
    /// Known partitions per topic
    topics: RwLock<HashMap<String, Vec<i32>>>,
    partitions: RwLock<HashMap<(String, i32), Arc<PartitionClient>>>,
}

impl KafkaTransport {
    /// Connect to the cluster and fetch topic metadata
    ///
    /// # Errors
    /// `BrokerConnection` if no host is given, a broker is unreachable, or
    /// the handshake exceeds [`CONNECT_TIMEOUT`].
    #[instrument(name = "kafka_connect", skip(hosts), fields(hosts = %hosts.join(",")))]
    pub async fn connect(hosts: &[String]) -> Result<Self, ContractError> {
        if hosts.is_empty() {
            return Err(ContractError::broker_connection(
                hosts,
                "at least one broker host is required",
            ));
        }

        let client = tokio::time::timeout(CONNECT_TIMEOUT, ClientBuilder::new(hosts.to_vec()).build())
            .await
            .map_err(|_| {
                ContractError::broker_connection(hosts, format!("timed out after {CONNECT_TIMEOUT:?}"))
            })?
            .map_err(|e| ContractError::broker_connection(hosts, e.to_string()))?;

        let listed = tokio::time::timeout(CONNECT_TIMEOUT, client.list_topics())
            .await
            .map_err(|_| ContractError::broker_connection(hosts, "metadata request timed out"))?
            .map_err(|e| ContractError::broker_connection(hosts, e.to_string()))?;

        let topics: HashMap<String, Vec<i32>> = listed
            .into_iter()
            .map(|topic| (topic.name, topic.partitions.into_iter().collect()))
            .collect();
        info!(topics = topics.len(), "Connected to Kafka");

        Ok(Self {
            name: format!("kafka[{}]", hosts.join(",")),
            client,
            topics: RwLock::new(topics),
            partitions: RwLock::new(HashMap::new()),
        })
    }

    async fn pick_partition(&self, topic: &str) -> Result<i32, ContractError> {
        if let Some(partition) = self.topics.read().await.get(topic).and_then(|p| random_of(p)) {
            return Ok(partition);
        }

        // Unknown topic, refresh metadata once
        let listed = self
            .client
            .list_topics()
            .await
            .map_err(|e| ContractError::broker_delivery(topic, e.to_string()))?;
        let mut topics = self.topics.write().await;
        for t in listed {
            topics.insert(t.name, t.partitions.into_iter().collect());
        }
        debug!(topic, known = topics.contains_key(topic), "Refreshed topic metadata");
        topics
            .get(topic)
            .and_then(|p| random_of(p))
            .ok_or_else(|| ContractError::broker_delivery(topic, "unknown topic"))
    }

    async fn partition_client(
        &self,
        topic: &str,
        partition: i32,
    ) -> Result<Arc<PartitionClient>, ContractError> {
        let key = (topic.to_string(), partition);
        if let Some(client) = self.partitions.read().await.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = self
            .client
            .partition_client(topic.to_string(), partition, UnknownTopicHandling::Error)
            .await
            .map_err(|e| ContractError::broker_delivery(topic, e.to_string()))?;
        let mut partitions = self.partitions.write().await;
        let client = partitions.entry(key).or_insert_with(|| Arc::new(client));
        Ok(Arc::clone(client))
    }
}

fn random_of(partitions: &[i32]) -> Option<i32> {
    if partitions.is_empty() {
        return None;
    }
    let index = rand::rng().random_range(0..partitions.len());
    Some(partitions[index])
}

impl BrokerTransport for KafkaTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, topic: &str, payload: &Bytes) -> Result<(), ContractError> {
        let partition = self.pick_partition(topic).await?;
        let client = self.partition_client(topic, partition).await?;

        let record = Record {
            key: None,
            value: Some(payload.to_vec()),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };
        client
            .produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|e| ContractError::broker_delivery(topic, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_partition_stays_in_range() {
        assert_eq!(random_of(&[]), None);
        assert_eq!(random_of(&[7]), Some(7));
        for _ in 0..100 {
            let picked = random_of(&[0, 1, 2]).unwrap();
            assert!((0..3).contains(&picked));
        }
    }

    #[tokio::test]
    async fn test_connect_requires_hosts() {
        let result = KafkaTransport::connect(&[]).await;
        assert!(matches!(result, Err(ContractError::BrokerConnection { .. })));
    }
}
