use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Auction duration in seconds.
    pub bidding_time_window: f64,
    /// Retention bound for the terminal task set.
    pub terminated_tasks_max_size: usize,
    /// Cadence of the ongoing-tasks broadcast, in seconds.
    pub publish_active_tasks_period: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub client_id: String,
    pub group_id: String,
    pub topics: KafkaTopics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaTopics {
    pub bid_notice: String,
    pub bid_proposal: String,
    pub dispatch_request: String,
    pub dispatch_ack: String,
    pub task_summary: String,
    pub active_tasks: String,
    pub dock_summary: String,
    pub fleet_state: String,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            kafka: KafkaConfig {
                brokers: vec!["localhost:9092".to_string()],
                client_id: "peregrine-fleet".to_string(),
                group_id: "peregrine-fleet-group".to_string(),
                topics: KafkaTopics {
                    bid_notice: "bid-notice".to_string(),
                    bid_proposal: "bid-proposal".to_string(),
                    dispatch_request: "dispatch-request".to_string(),
                    dispatch_ack: "dispatch-ack".to_string(),
                    task_summary: "task-summary".to_string(),
                    active_tasks: "active-tasks".to_string(),
                    dock_summary: "dock-summary".to_string(),
                    fleet_state: "fleet-state".to_string(),
                },
            },
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            bidding_time_window: 2.0,
            terminated_tasks_max_size: 100,
            publish_active_tasks_period: 2,
        }
    }
}
