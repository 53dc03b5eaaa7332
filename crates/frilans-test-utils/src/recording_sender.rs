// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message sender that records what it sends.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use frilans_core::types::{AdapterType, MessageId, OutboundMessage, UserId};
use frilans_core::{Adapter, FrilansError, MessageSender};

/// Captures every successful send for assertions.
///
/// Failures can be injected two ways: [`fail_next`](Self::fail_next) fails
/// the next `n` attempts regardless of recipient, and
/// [`fail_user`](Self::fail_user) fails every attempt for one user.
pub struct RecordingSender {
    sent: Mutex<Vec<OutboundMessage>>,
    failing_users: Mutex<HashSet<UserId>>,
    fail_next: AtomicU32,
    attempts: AtomicUsize,
    max_message_chars: Option<usize>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_users: Mutex::new(HashSet::new()),
            fail_next: AtomicU32::new(0),
            attempts: AtomicUsize::new(0),
            max_message_chars: None,
        }
    }

    /// A sender that advertises a message length limit, like a real transport.
    pub fn with_message_limit(limit: usize) -> Self {
        Self {
            max_message_chars: Some(limit),
            ..Self::new()
        }
    }

    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub async fn fail_user(&self, user_id: UserId) {
        self.failing_users.lock().await.insert(user_id);
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, user_id: UserId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Send attempts so far, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for RecordingSender {
    fn name(&self) -> &str {
        "recording-sender"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    fn max_message_chars(&self) -> Option<usize> {
        self.max_message_chars
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FrilansError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.failing_users.lock().await.contains(&msg.user_id) {
            return Err(FrilansError::Delivery {
                message: format!("chat {} rejected the message", msg.user_id),
                source: None,
            });
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(FrilansError::Delivery {
                message: "injected transient failure".into(),
                source: None,
            });
        }

        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("rec-{}", uuid::Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(user: i64) -> OutboundMessage {
        OutboundMessage {
            user_id: UserId(user),
            text: "hello".into(),
            listing_refs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn records_successful_sends() {
        let sender = RecordingSender::new();
        let id = sender.send(msg(1)).await.unwrap();
        assert!(id.0.starts_with("rec-"));
        assert_eq!(sender.sent_to(UserId(1)).await.len(), 1);
        assert_eq!(sender.attempts(), 1);
    }

    #[tokio::test]
    async fn fail_next_is_consumed() {
        let sender = RecordingSender::new();
        sender.fail_next(2);
        assert!(sender.send(msg(1)).await.is_err());
        assert!(sender.send(msg(1)).await.is_err());
        assert!(sender.send(msg(1)).await.is_ok());
        assert_eq!(sender.sent_count().await, 1);
        assert_eq!(sender.attempts(), 3);
    }

    #[tokio::test]
    async fn failing_user_never_receives() {
        let sender = RecordingSender::new();
        sender.fail_user(UserId(7)).await;
        let err = sender.send(msg(7)).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(sender.send(msg(8)).await.is_ok());
        assert!(sender.sent_to(UserId(7)).await.is_empty());
    }
}
