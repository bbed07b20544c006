use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::entities::stock_verification::{VerificationStatus, VerificationType};

/// Domain events emitted after a transaction commits. Handlers must never
/// affect the outcome of the operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RiderRestocked {
        store_id: i64,
        rider_id: i64,
        item_count: usize,
        total_units: i64,
    },
    VerificationSubmitted {
        verification_id: i64,
        store_id: i64,
        rider_id: i64,
        verification_type: VerificationType,
    },
    VerificationResolved {
        verification_id: i64,
        outcome: VerificationStatus,
        verified_by: i64,
    },
    OrderCreated {
        order_id: i64,
        store_id: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging (but not propagating) delivery failures so a
    /// stalled consumer can never fail a committed operation.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("failed to publish event: {}", e);
        }
    }
}

/// Consumes events from the channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::RiderRestocked {
                store_id,
                rider_id,
                item_count,
                total_units,
            } => {
                info!(
                    store_id,
                    rider_id, item_count, total_units, "rider restocked"
                );
                counter!("vendhub_restocks.total", 1);
                counter!("vendhub_restocks.units", *total_units as u64);
            }
            Event::VerificationSubmitted {
                verification_id,
                store_id,
                rider_id,
                verification_type,
            } => {
                info!(
                    verification_id,
                    store_id,
                    rider_id,
                    ?verification_type,
                    "stock verification submitted"
                );
                counter!("vendhub_verifications.submitted", 1);
            }
            Event::VerificationResolved {
                verification_id,
                outcome,
                verified_by,
            } => {
                info!(
                    verification_id,
                    ?outcome,
                    verified_by,
                    "stock verification resolved"
                );
                counter!("vendhub_verifications.resolved", 1);
            }
            Event::OrderCreated { order_id, store_id } => {
                info!(order_id, store_id, "order created");
                counter!("vendhub_orders.created", 1);
            }
        }
    }

    info!("event channel closed, stopping event processing loop");
}
