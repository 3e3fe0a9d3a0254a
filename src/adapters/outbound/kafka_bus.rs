use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::common::TransportError;
use crate::config::{KafkaConfig, KafkaTopics};
use crate::domains::dispatch::ports::MessageBus;
use crate::domains::messages::{
    ActiveTasksMsg, BidNotice, BidProposal, DispatchAck, DispatchRequest,
    DockSummary, FleetStateMsg,
};
use crate::domains::tasks::TaskStatus;

/// Kafka-backed message bus. Publish-only: consumption and routing into
/// the workers is the deployment's concern (a consumer loop per topic
/// feeding the respective command channels).
pub struct KafkaMessageBus {
    producer: FutureProducer,
    topics: KafkaTopics,
}

impl KafkaMessageBus {
    pub fn new(config: &KafkaConfig) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| {
                TransportError(format!("failed to create Kafka producer: {}", e))
            })?;

        Ok(Self { producer, topics: config.topics.clone() })
    }

    async fn send<T: Serialize>(
        &self,
        topic: &str,
        key: &str,
        message: &T,
    ) -> Result<(), TransportError> {
        let payload = serde_json::to_string(message).map_err(|e| {
            TransportError(format!("failed to serialize message: {}", e))
        })?;

        let record = FutureRecord::to(topic).key(key).payload(&payload);
        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| {
                TransportError(format!("failed to send to Kafka: {}", e))
            })?;
        Ok(())
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    async fn publish_bid_notice(
        &self,
        notice: &BidNotice,
    ) -> Result<(), TransportError> {
        self.send(&self.topics.bid_notice, &notice.task_profile.task_id, notice)
            .await
    }

    async fn publish_bid_proposal(
        &self,
        proposal: &BidProposal,
    ) -> Result<(), TransportError> {
        self.send(&self.topics.bid_proposal, proposal.task_id(), proposal).await
    }

    async fn publish_dispatch_request(
        &self,
        request: &DispatchRequest,
    ) -> Result<(), TransportError> {
        self.send(&self.topics.dispatch_request, request.task_id(), request)
            .await
    }

    async fn publish_dispatch_ack(
        &self,
        ack: &DispatchAck,
    ) -> Result<(), TransportError> {
        self.send(
            &self.topics.dispatch_ack,
            ack.dispatch_request.task_id(),
            ack,
        )
        .await
    }

    async fn publish_task_summary(
        &self,
        summary: &TaskStatus,
    ) -> Result<(), TransportError> {
        self.send(&self.topics.task_summary, summary.task_id(), summary).await
    }

    async fn publish_active_tasks(
        &self,
        tasks: &ActiveTasksMsg,
    ) -> Result<(), TransportError> {
        let key = Uuid::new_v4().to_string();
        self.send(&self.topics.active_tasks, &key, tasks).await
    }

    async fn publish_dock_summary(
        &self,
        summary: &DockSummary,
    ) -> Result<(), TransportError> {
        let key = Uuid::new_v4().to_string();
        self.send(&self.topics.dock_summary, &key, summary).await
    }

    async fn publish_fleet_state(
        &self,
        state: &FleetStateMsg,
    ) -> Result<(), TransportError> {
        self.send(&self.topics.fleet_state, &state.name, state).await
    }
}
