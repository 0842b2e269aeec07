//! Notification Fan-out Service
//!
//! Consumes queued [`Notification`]s and delivers them as SMS. The webhook
//! handler answers the sender inline; everything addressed to a third party
//! (approvers, nominees, owners, requesters) goes through this queue so a
//! slow gateway call never delays the webhook ACK.
//!
//! Delivery is at-most-once: a failed send is logged and dropped.

use crossbeam_queue::ArrayQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::clients::SmsSender;
use crate::dispatch::Notification;
use crate::sms::compose;

/// Max notifications drained per tick
const DRAIN_BATCH: usize = 100;

pub struct NotifyService {
    sms: Arc<dyn SmsSender>,
    queue: Arc<ArrayQueue<Notification>>,
}

impl NotifyService {
    pub fn new(sms: Arc<dyn SmsSender>, queue: Arc<ArrayQueue<Notification>>) -> Self {
        Self { sms, queue }
    }

    /// Run the service (drains the queue and sends each message).
    ///
    /// This runs in a tokio task and continuously polls the queue.
    pub async fn run(self) {
        let mut tick = interval(Duration::from_millis(50));
        tracing::info!("[NotifyService] Started - polling notification queue");

        loop {
            tick.tick().await;

            let mut count = 0;
            while let Some(notification) = self.queue.pop() {
                self.deliver(notification).await;
                count += 1;
                if count >= DRAIN_BATCH {
                    break;
                }
            }
        }
    }

    async fn deliver(&self, notification: Notification) {
        let content = compose(&notification.reply);
        match self.sms.send(&notification.to_phone, &content).await {
            Ok(receipt) => {
                tracing::debug!(
                    to = %notification.to_phone,
                    message_id = %receipt.message_id,
                    "[NotifyService] Notification sent"
                );
            }
            Err(e) => {
                tracing::warn!(
                    to = %notification.to_phone,
                    "[NotifyService] Notification dropped: {}", e
                );
            }
        }
    }
}

/// Enqueue one notification, dropping it with a log line when the queue is
/// full. Used by the webhook handler after dispatch.
pub fn enqueue(queue: &ArrayQueue<Notification>, notification: Notification) {
    if let Err(dropped) = queue.push(notification) {
        tracing::warn!(
            to = %dropped.to_phone,
            "[NotifyService] Queue full, notification dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockSms;
    use crate::sms::Reply;

    fn note(to: &str) -> Notification {
        Notification {
            to_phone: to.to_string(),
            reply: Reply::NominationAnswerRecorded,
        }
    }

    #[tokio::test]
    async fn test_deliver_sends_composed_text() {
        let sms = Arc::new(MockSms::new());
        let queue = Arc::new(ArrayQueue::new(4));
        let service = NotifyService::new(sms.clone(), queue);

        service.deliver(note("+15550001111")).await;

        let sent = sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+15550001111");
        assert_eq!(sent[0].content, "Your response has been recorded.");
    }

    #[tokio::test]
    async fn test_send_failure_is_dropped() {
        let sms = Arc::new(MockSms::new());
        sms.set_fail(true);
        let queue = Arc::new(ArrayQueue::new(4));
        let service = NotifyService::new(sms.clone(), queue);

        // Must not propagate the failure
        service.deliver(note("+15550001111")).await;
        assert!(sms.sent().is_empty());
    }

    #[test]
    fn test_enqueue_drops_when_full() {
        let queue = ArrayQueue::new(1);
        enqueue(&queue, note("+15550001111"));
        enqueue(&queue, note("+15550002222"));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().unwrap().to_phone, "+15550001111");
    }
}
