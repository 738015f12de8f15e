use common::notification::ChatMessage;
use common::worker::{TASK_NOTIFY, Task};
use mq::MqQueue;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, warn};

use crate::entity::user_profile;

/// Everything the system tells people about, in one place. Each event
/// renders to a chat message and resolves its own recipients.
#[derive(Debug)]
pub enum OutboundEvent {
    /// A retouch request was assigned to a retoucher.
    AssignmentCreated {
        retoucher_id: i32,
        request_number: i32,
        product_count: usize,
    },
    /// A senior retoucher sent a request back for rework.
    ReworkRequested {
        retoucher_id: i32,
        request_number: i32,
        rejected_count: usize,
    },
    /// The archive for a completed request is ready to download.
    ArchiveReady {
        retoucher_id: i32,
        request_number: i32,
    },
    /// The archive build failed after all retries.
    ArchiveFailed {
        retoucher_id: i32,
        request_number: i32,
        reason: String,
    },
    /// The same barcode reached the defect threshold. Carries one
    /// rendered "timestamp: comment" line per defect operation.
    DefectAlert {
        barcode: String,
        occurrences: Vec<String>,
    },
    /// A senior finished checking a shooting request.
    ShootingChecked {
        photographer_id: i32,
        request_number: i32,
        rejected_count: usize,
    },
    /// An order was closed with missing products.
    OrderDiscrepancy {
        creator_id: i32,
        order_number: i32,
        missing_barcodes: Vec<String>,
    },
}

impl OutboundEvent {
    fn text(&self) -> String {
        match self {
            OutboundEvent::AssignmentCreated {
                request_number,
                product_count,
                ..
            } => format!(
                "Retouch request #{request_number} assigned to you ({product_count} products)"
            ),
            OutboundEvent::ReworkRequested {
                request_number,
                rejected_count,
                ..
            } => format!(
                "Retouch request #{request_number} returned for rework ({rejected_count} rejected)"
            ),
            OutboundEvent::ArchiveReady { request_number, .. } => {
                format!("Archive for retouch request #{request_number} is ready")
            }
            OutboundEvent::ArchiveFailed {
                request_number,
                reason,
                ..
            } => format!("Archive for retouch request #{request_number} failed: {reason}"),
            OutboundEvent::DefectAlert {
                barcode,
                occurrences,
            } => format!(
                "Barcode {barcode} marked defective {} times:\n{}",
                occurrences.len(),
                occurrences.join("\n")
            ),
            OutboundEvent::ShootingChecked {
                request_number,
                rejected_count,
                ..
            } => {
                if *rejected_count == 0 {
                    format!("Shooting request #{request_number} fully accepted")
                } else {
                    format!(
                        "Shooting request #{request_number} checked, {rejected_count} photos rejected"
                    )
                }
            }
            OutboundEvent::OrderDiscrepancy {
                order_number,
                missing_barcodes,
                ..
            } => format!(
                "Order #{order_number} closed with {} products missing: {}",
                missing_barcodes.len(),
                missing_barcodes.join(", ")
            ),
        }
    }

    /// User whose linked chat should receive the message, if the event
    /// targets a single person rather than the alert chat.
    fn target_user(&self) -> Option<i32> {
        match self {
            OutboundEvent::AssignmentCreated { retoucher_id, .. }
            | OutboundEvent::ReworkRequested { retoucher_id, .. }
            | OutboundEvent::ArchiveReady { retoucher_id, .. }
            | OutboundEvent::ArchiveFailed { retoucher_id, .. } => Some(*retoucher_id),
            OutboundEvent::ShootingChecked { photographer_id, .. } => Some(*photographer_id),
            OutboundEvent::OrderDiscrepancy { creator_id, .. } => Some(*creator_id),
            OutboundEvent::DefectAlert { .. } => None,
        }
    }
}

/// Publishes chat messages for domain events. Delivery is best-effort:
/// a failed publish is logged and never fails the originating request.
#[derive(Clone)]
pub struct Notifier {
    mq: Option<MqQueue>,
    queue_name: String,
    alert_chat_id: Option<i64>,
}

impl Notifier {
    pub fn new(mq: Option<MqQueue>, queue_name: String, alert_chat_id: Option<i64>) -> Self {
        Self {
            mq,
            queue_name,
            alert_chat_id,
        }
    }

    /// Resolve the event's recipient and enqueue a chat message.
    /// Call after the surrounding transaction commits.
    pub async fn send(&self, db: &DatabaseConnection, event: OutboundEvent) {
        let Some(ref mq) = self.mq else {
            debug!("MQ unavailable, skipping notification");
            return;
        };

        let chat_id = match event.target_user() {
            Some(user_id) => match self.chat_id_for(db, user_id).await {
                Some(id) => id,
                None => {
                    debug!(user_id, "No linked chat for user, dropping notification");
                    return;
                }
            },
            None => match self.alert_chat_id {
                Some(id) => id,
                None => {
                    debug!("No alert chat configured, dropping alert");
                    return;
                }
            },
        };

        let message = ChatMessage::new(chat_id, event.text());
        let task = match Task::wrap(TASK_NOTIFY, &message) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Failed to serialize chat message");
                return;
            }
        };

        if let Err(e) = mq.publish(&self.queue_name, None, &task, None).await {
            warn!(error = %e, ?event, "Failed to enqueue notification");
        }
    }

    async fn chat_id_for(&self, db: &DatabaseConnection, user_id: i32) -> Option<i64> {
        match user_profile::Entity::find()
            .filter(user_profile::Column::UserId.eq(user_id))
            .one(db)
            .await
        {
            Ok(profile) => profile.and_then(|p| p.chat_id),
            Err(e) => {
                warn!(error = %e, user_id, "DB error resolving chat id");
                None
            }
        }
    }
}
