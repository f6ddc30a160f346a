//! Realtime notification payloads carried by `new_message` envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use terakoya_shared::protocol::{Envelope, event};

use crate::domain::Notification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationDto {
    /// Message relayed from another user
    Direct {
        from: String,
        content: String,
        sent_at: DateTime<Utc>,
    },
    /// Quiz closing soon while the recipient still has an attempt in progress
    DeadlineReminder {
        quiz_id: String,
        title: String,
        close_date: DateTime<Utc>,
    },
}

impl From<&Notification> for NotificationDto {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::Direct {
                from,
                content,
                sent_at,
            } => Self::Direct {
                from: from.to_string(),
                content: content.clone(),
                sent_at: *sent_at,
            },
            Notification::DeadlineReminder {
                quiz_id,
                title,
                close_date,
            } => Self::DeadlineReminder {
                quiz_id: quiz_id.to_string(),
                title: title.clone(),
                close_date: *close_date,
            },
        }
    }
}

impl NotificationDto {
    /// Wrap into a `new_message` envelope and encode as JSON text
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        Envelope::new(event::NEW_MESSAGE, serde_json::to_value(self)?).to_json()
    }
}
