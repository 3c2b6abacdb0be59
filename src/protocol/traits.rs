//! Protocol client trait abstraction.
//!
//! Modeling the server as an injected capability keeps the upload engine and
//! retrieval catalog independent of any concrete transport, and lets tests
//! run against the deterministic [`crate::protocol::MockServer`].

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AccountId, LocalId};

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Protocol client errors.
///
/// `Transport` means the call never completed (connection error, absent
/// response); it is deliberately a different kind from `Rejected`, because
/// the upload engine reports the two differently.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("malformed server response: {0}")]
    Malformed(String),
}

/// Server verdict on an upload attempt.
///
/// Rejection is in-band rather than an `Err` because the engine echoes the
/// server's tag verbatim in its pass outcome while leaving the bulletin
/// queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Ok,
    Rejected(String),
}

/// The remote server operations consumed by this crate.
///
/// All calls block the calling task until a response or a transport failure
/// is observed. Timeouts and retries are the implementation's concern; the
/// engine and catalog impose none of their own.
#[async_trait]
pub trait ProtocolClient {
    /// Submit one packaged, signed bulletin for the given account.
    async fn upload_bulletin(
        &self,
        account: &AccountId,
        packaged: &[u8],
    ) -> ProtocolResult<UploadStatus>;

    /// Field-office account ids that have designated bulletins for this HQ.
    async fn list_field_office_accounts(&self, hq: &AccountId) -> ProtocolResult<Vec<AccountId>>;

    /// Manifest of sealed bulletins the author has flagged retrievable by
    /// this HQ. Entries have the form `localId=fdpLocalId=sizeBytes`.
    async fn list_field_office_sealed_bulletin_ids(
        &self,
        hq: &AccountId,
        author: &AccountId,
        tags: &[String],
    ) -> ProtocolResult<Vec<String>>;

    /// Fetch one signed packet belonging to a field-office bulletin.
    async fn get_packet(
        &self,
        hq: &AccountId,
        author: &AccountId,
        bulletin: &LocalId,
        packet: &LocalId,
    ) -> ProtocolResult<Vec<u8>>;
}
