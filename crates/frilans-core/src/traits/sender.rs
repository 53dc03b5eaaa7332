// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging capability used by the dispatcher.

use async_trait::async_trait;

use crate::error::FrilansError;
use crate::traits::adapter::Adapter;
use crate::types::{MessageId, OutboundMessage};

/// Delivers rendered messages to subscribers.
///
/// `send` returns `Ok` only once the transport has accepted the message;
/// the dispatcher writes delivery records on that confirmation alone.
#[async_trait]
pub trait MessageSender: Adapter {
    /// Longest message text the transport accepts, in characters.
    ///
    /// The dispatcher splits batches so no rendered message exceeds it.
    fn max_message_chars(&self) -> Option<usize> {
        None
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FrilansError>;
}
