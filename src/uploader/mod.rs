//! Background upload engine.
//!
//! Drains the local delivery queues against the protocol client, one pass at
//! a time. The engine never schedules itself; an external driver calls
//! [`UploadEngine::run_one_pass`] repeatedly and interleaves other work
//! between calls.
//!
//! Partial-failure discipline: a bulletin leaves its queue folder only on an
//! explicit OK from the server for that exact bulletin. A rejection or a
//! transport failure leaves every folder untouched.

pub mod log;

use thiserror::Error;

pub use log::UploadLog;

use crate::crypto::AccountKey;
use crate::model::store::{ClientStore, Queue, StoreError};
use crate::model::{AccountId, Bulletin, UniversalId};
use crate::protocol::packet::{FieldDataPacket, SignedPacket};
use crate::protocol::{PacketError, ProtocolClient, ProtocolError, UploadStatus};

/// Outcome of a single engine pass.
///
/// `NoServer` is a soft no-op, distinct from both `Ok` and the failure
/// variants: nothing was attempted because no server is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    NoServer,
    Ok,
    Rejected(String),
    TransportFailed,
}

/// Local faults that abort a pass. Server-side failures never appear here;
/// they are reported through [`PassOutcome`] with folders left intact.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("queued bulletin missing from store: {0}")]
    Store(#[from] StoreError),

    #[error("bulletin could not be packaged: {0}")]
    Packaging(#[from] PacketError),

    #[error("upload log write failed: {0}")]
    Log(#[from] std::io::Error),
}

/// Identity of the configured server.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Human-chosen label, echoed into the upload log.
    pub label: String,
    /// The server's account id.
    pub account: AccountId,
}

/// Drains the outbox and draft outbox against the configured server.
pub struct UploadEngine<C> {
    client: C,
    server: Option<ServerInfo>,
    key: AccountKey,
    store: ClientStore,
    log: UploadLog,
}

impl<C: ProtocolClient> UploadEngine<C> {
    pub fn new(client: C, server: Option<ServerInfo>, key: AccountKey, log: UploadLog) -> Self {
        Self {
            client,
            server,
            key,
            store: ClientStore::new(),
            log,
        }
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ClientStore {
        &mut self.store
    }

    pub fn account_id(&self) -> &AccountId {
        self.key.account_id()
    }

    /// Attempt delivery of at most one bulletin per folder, sealed work
    /// first. Returns the status of the last attempted item, `Ok` when both
    /// folders succeeded or were empty, or `NoServer` when no server is
    /// configured.
    ///
    /// A non-OK outcome on the sealed outbox ends the pass before the draft
    /// outbox is attempted: committed work keeps priority over drafts.
    pub async fn run_one_pass(&mut self) -> Result<PassOutcome, UploadError> {
        let Some(server) = self.server.clone() else {
            tracing::debug!("no server configured, skipping upload pass");
            return Ok(PassOutcome::NoServer);
        };

        let outcome = self.upload_front(&server, Queue::Outbox).await?;
        if outcome != PassOutcome::Ok {
            return Ok(outcome);
        }
        self.upload_front(&server, Queue::DraftOutbox).await
    }

    /// Deliver the front entry of one folder, if any.
    async fn upload_front(
        &mut self,
        server: &ServerInfo,
        queue: Queue,
    ) -> Result<PassOutcome, UploadError> {
        let Some(id) = self.store.front(queue) else {
            return Ok(PassOutcome::Ok);
        };
        let bulletin = self
            .store
            .bulletin(&id)
            .ok_or_else(|| StoreError::UnknownBulletin(id.clone()))?
            .clone();

        let packaged = package_bulletin(&bulletin, &self.key)?;
        match self.client.upload_bulletin(self.key.account_id(), &packaged).await {
            Ok(UploadStatus::Ok) => {
                self.record_delivery(server, queue, &bulletin)?;
                Ok(PassOutcome::Ok)
            }
            Ok(UploadStatus::Rejected(tag)) => {
                tracing::warn!(bulletin = %id, tag = %tag, "server rejected upload");
                Ok(PassOutcome::Rejected(tag))
            }
            Err(ProtocolError::Rejected(tag)) => {
                tracing::warn!(bulletin = %id, tag = %tag, "server refused upload request");
                Ok(PassOutcome::Rejected(tag))
            }
            Err(err) => {
                // Transport failure or an unreadable response: the verdict
                // is unknown, so the bulletin stays queued.
                tracing::warn!(bulletin = %id, error = %err, "upload did not complete");
                Ok(PassOutcome::TransportFailed)
            }
        }
    }

    fn record_delivery(
        &mut self,
        server: &ServerInfo,
        queue: Queue,
        bulletin: &Bulletin,
    ) -> Result<(), UploadError> {
        let id: &UniversalId = &bulletin.id;
        match queue {
            Queue::Outbox => self.store.deliver_sealed(id)?,
            Queue::DraftOutbox => self.store.deliver_draft(id)?,
        }
        tracing::info!(bulletin = %id, server = %server.label, "bulletin delivered");
        if self.log.is_enabled() {
            self.log.append(&id.local, &server.label, &bulletin.title)?;
        }
        Ok(())
    }
}

/// Package a bulletin for upload: its field data packet, signed by the
/// authoring account.
fn package_bulletin(bulletin: &Bulletin, key: &AccountKey) -> Result<Vec<u8>, PacketError> {
    let packet = FieldDataPacket::for_bulletin(bulletin);
    SignedPacket::seal(&packet, key)
}
