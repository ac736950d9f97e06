//! MQTT records describing the experiment state
//!
//! The daemon builds the messages the experiment publishes and logs them on
//! this module's target, whose verbosity is `logging.mqtt_level`.

use ramp_core::config::{MqttConfig, QoS, TopicsConfig};
use ramp_core::mqtt::{encode_angle, encode_timestamp, unix_seconds};
use ramp_core::Status;
use std::time::SystemTime;
use tracing::debug;

/// A message ready to be published
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Publication {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

/// Builds publications for the configured topics
#[derive(Debug, Clone)]
pub(crate) struct Records {
    topics: TopicsConfig,
    qos: QoS,
}

impl Records {
    pub fn new(mqtt: &MqttConfig, topics: &TopicsConfig) -> Self {
        Self {
            topics: topics.clone(),
            qos: mqtt.qos,
        }
    }

    fn publication(&self, topic: &str, payload: &[u8]) -> Publication {
        Publication {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos: self.qos,
        }
    }

    pub fn status(&self, status: Status) -> Publication {
        self.publication(&self.topics.status, &status.to_bytes())
    }

    /// Current ramp angle in radians
    pub fn current(&self, radians: f64) -> Publication {
        self.publication(&self.topics.current, &encode_angle(radians))
    }

    pub fn timestamp(&self, time: SystemTime) -> Publication {
        self.publication(&self.topics.timestamp, &encode_timestamp(unix_seconds(time)))
    }

    /// Record the publication
    pub fn emit(&self, publication: &Publication) {
        debug!(
            topic = %publication.topic,
            qos = u8::from(publication.qos),
            payload = ?publication.payload,
            "publish"
        );
    }
}
