use super::table::RemovalPolicy;
use serde::Serialize;

/// Object lifecycle events a unit can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEvent {
    ObjectCreated,
    ObjectRemoved,
}

impl BucketEvent {
    /// S3 notification event name
    pub fn s3_event(&self) -> &'static str {
        match self {
            BucketEvent::ObjectCreated => "s3:ObjectCreated:*",
            BucketEvent::ObjectRemoved => "s3:ObjectRemoved:*",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSubscription {
    pub event: BucketEvent,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketDecl {
    pub logical_id: String,
    pub bucket_name: String,
    pub removal_policy: RemovalPolicy,
    pub subscriptions: Vec<NotificationSubscription>,
}

impl BucketDecl {
    pub fn new(bucket_name: &str) -> Self {
        Self {
            logical_id: "Bucket".to_string(),
            bucket_name: bucket_name.to_string(),
            removal_policy: RemovalPolicy::Retain,
            subscriptions: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, event: BucketEvent, unit: &str) {
        self.subscriptions.push(NotificationSubscription {
            event,
            unit: unit.to_string(),
        });
    }
}
