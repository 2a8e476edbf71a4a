//! Notification bus for user-visible success and failure messages
//!
//! The bus keeps the list of currently active notifications and broadcasts every
//! change to its subscribers. A [`Subscription`] stops receiving as soon as it is
//! dropped or [`Subscription::unsubscribe`] is called.

use crate::config::RankBoardConfig;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Identifier of a posted notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(u64);

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Change delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    Posted(Notification),
    Dismissed(NotificationId),
}

/// Owner of the active notifications and their broadcast channel
#[derive(Debug)]
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
    active: Vec<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl NotificationBus {
    /// Create a bus buffering up to `capacity` undelivered events per subscriber
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            active: Vec::new(),
            next_id: 0,
            ttl,
        }
    }

    /// Create a bus sized and timed from configuration
    pub fn from_config(config: &RankBoardConfig) -> Self {
        Self::new(config.notification_capacity, config.notification_ttl())
    }

    /// Start receiving events
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Notifications that have been posted and not yet dismissed
    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    pub fn success(&mut self, message: impl Into<String>) -> NotificationId {
        self.post(NotificationKind::Success, message.into())
    }

    pub fn error(&mut self, message: impl Into<String>) -> NotificationId {
        self.post(NotificationKind::Error, message.into())
    }

    fn post(&mut self, kind: NotificationKind, message: String) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let notification = Notification {
            id,
            kind,
            message,
            created_at: Utc::now(),
        };
        self.active.push(notification.clone());
        self.broadcast(NotificationEvent::Posted(notification));
        id
    }

    /// Remove a notification. Returns false if it was not active.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        let removed = self.active.len() != before;
        if removed {
            self.broadcast(NotificationEvent::Dismissed(id));
        }
        removed
    }

    /// Dismiss every notification older than the configured time-to-live
    pub fn dismiss_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<NotificationId> = self
            .active
            .iter()
            .filter(|n| now - n.created_at >= self.ttl)
            .map(|n| n.id)
            .collect();
        for id in &expired {
            self.dismiss(*id);
        }
        expired.len()
    }

    fn broadcast(&self, event: NotificationEvent) {
        if self.sender.send(event).is_err() {
            trace!("no notification subscribers");
        }
    }
}

/// Receiving end of a [`NotificationBus`]
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<NotificationEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the bus is gone.
    ///
    /// Events lost because this subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Stop receiving events
    pub fn unsubscribe(self) {}
}
