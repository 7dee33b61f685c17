//! 进程内变更广播：写操作发布事件，订阅者按租户过滤后推送给前端。
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub table: &'static str,
    pub action: ChangeAction,
    pub business_id: Uuid,
    pub record: serde_json::Value,
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 没有订阅者时直接丢弃
    pub fn publish<T: Serialize>(&self, table: &'static str, action: ChangeAction, business_id: Uuid, record: &T) {
        let record = match serde_json::to_value(record) {
            Ok(v) => v,
            Err(e) => {
                warn!(table, error = %e, "realtime payload serialize failed");
                return;
            }
        };
        let delivered = self.tx.send(ChangeEvent { table, action, business_id, record }).unwrap_or(0);
        debug!(table, ?action, %business_id, delivered, "realtime event published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// 只包含该租户事件的流；落后过多时跳过丢失的部分
    pub fn subscribe_business(&self, business_id: Uuid) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| match item {
            Ok(ev) if ev.business_id == business_id => Some(ev),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(%business_id, skipped = n, "realtime subscriber lagged");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn subscriber_sees_only_own_business() {
        let hub = EventHub::new(16);
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        let stream = hub.subscribe_business(mine);
        tokio::pin!(stream);
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish("bookings", ChangeAction::Insert, other, &serde_json::json!({ "id": 1 }));
        hub.publish("bookings", ChangeAction::Update, mine, &serde_json::json!({ "id": 2 }));

        let ev = tokio::time::timeout(Duration::from_secs(1), stream.next()).await.unwrap().unwrap();
        assert_eq!(ev.business_id, mine);
        assert_eq!(ev.action, ChangeAction::Update);
        assert_eq!(ev.record["id"], 2);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let hub = EventHub::default();
        hub.publish("invoices", ChangeAction::Delete, Uuid::new_v4(), &serde_json::json!({}));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn event_wire_shape() {
        let ev = ChangeEvent {
            table: "service_tracking",
            action: ChangeAction::Insert,
            business_id: Uuid::nil(),
            record: serde_json::json!({ "status": "en_route" }),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["table"], "service_tracking");
        assert_eq!(v["action"], "insert");
        assert!(v.get("businessId").is_some());
    }
}
