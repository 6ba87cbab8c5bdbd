use levy_core::{Notifier, TaxFailureEvent};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Could not encode failure event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// Publishes tax failure events to a Kafka topic, keyed by order id
#[derive(Clone)]
pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer, topic: topic.to_string() })
    }

    pub async fn publish(&self, event: &TaxFailureEvent) -> Result<(), NotifyError> {
        let payload = encode(event)?;
        let record = FutureRecord::to(&self.topic)
            .key(&event.order_id)
            .payload(&payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent {} for order {} to {}: partition {} offset {}",
                    event.failure_kind, event.order_id, self.topic, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send failure event to {}: {}", self.topic, e);
                Err(e.into())
            }
        }
    }
}

impl Notifier for KafkaNotifier {
    fn notify(&self, event: TaxFailureEvent) {
        // Delivery must not hold up the tax response
        match Handle::try_current() {
            Ok(handle) => {
                let notifier = self.clone();
                handle.spawn(async move {
                    let _ = notifier.publish(&event).await;
                });
            }
            Err(_) => warn!(order_id = %event.order_id, "No async runtime, dropping failure event for Kafka"),
        }
    }
}

pub fn encode(event: &TaxFailureEvent) -> Result<String, NotifyError> {
    Ok(serde_json::to_string(event)?)
}
