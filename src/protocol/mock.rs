//! Deterministic in-memory server for tests.
//!
//! `MockServer` implements [`ProtocolClient`] entirely in memory and exposes
//! knobs for every failure mode the engine and catalog must handle: scripted
//! upload rejections, transport outages, absent account listings, and
//! arbitrary manifest/packet contents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{ProtocolClient, ProtocolError, ProtocolResult, UploadStatus};
use crate::model::{AccountId, LocalId};

/// In-memory server double.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Verdict returned for every upload; `None` means OK.
    upload_response: Option<String>,
    /// When set, every call fails with a transport error.
    transport_down: bool,
    /// When set, `list_field_office_accounts` fails (absent response).
    drop_account_listing: bool,
    uploads: Vec<RecordedUpload>,
    packet_fetches: usize,
    field_offices: HashMap<AccountId, Vec<AccountId>>,
    manifests: HashMap<AccountId, Vec<String>>,
    packets: HashMap<(AccountId, LocalId), Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub account: AccountId,
    pub packaged: Vec<u8>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a rejection tag for subsequent uploads. `None` restores OK.
    pub fn set_upload_response(&self, tag: Option<&str>) {
        self.state.lock().unwrap().upload_response = tag.map(str::to_string);
    }

    /// Simulate the link going down: every call fails with a transport
    /// error until restored.
    pub fn set_transport_down(&self, down: bool) {
        self.state.lock().unwrap().transport_down = down;
    }

    /// Make the field-office account listing return an absent response.
    pub fn set_drop_account_listing(&self, drop: bool) {
        self.state.lock().unwrap().drop_account_listing = drop;
    }

    /// Associate a field-office account with an HQ account.
    pub fn add_field_office(&self, hq: &AccountId, author: &AccountId) {
        let mut state = self.state.lock().unwrap();
        let offices = state.field_offices.entry(hq.clone()).or_default();
        if !offices.contains(author) {
            offices.push(author.clone());
        }
    }

    /// Add a raw manifest entry for an author account.
    pub fn add_manifest_entry(&self, author: &AccountId, entry: &str) {
        self.state
            .lock()
            .unwrap()
            .manifests
            .entry(author.clone())
            .or_default()
            .push(entry.to_string());
    }

    /// Store packet bytes retrievable via `get_packet`.
    pub fn put_packet(&self, author: &AccountId, packet: &LocalId, bytes: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .packets
            .insert((author.clone(), packet.clone()), bytes);
    }

    /// Uploads received so far, for assertions.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    /// How many `get_packet` calls the server has answered.
    pub fn packet_fetch_count(&self) -> usize {
        self.state.lock().unwrap().packet_fetches
    }
}

#[async_trait]
impl ProtocolClient for MockServer {
    async fn upload_bulletin(
        &self,
        account: &AccountId,
        packaged: &[u8],
    ) -> ProtocolResult<UploadStatus> {
        let mut state = self.state.lock().unwrap();
        if state.transport_down {
            return Err(ProtocolError::Transport("link down".to_string()));
        }
        state.uploads.push(RecordedUpload {
            account: account.clone(),
            packaged: packaged.to_vec(),
        });
        match &state.upload_response {
            Some(tag) => Ok(UploadStatus::Rejected(tag.clone())),
            None => Ok(UploadStatus::Ok),
        }
    }

    async fn list_field_office_accounts(&self, hq: &AccountId) -> ProtocolResult<Vec<AccountId>> {
        let state = self.state.lock().unwrap();
        if state.transport_down || state.drop_account_listing {
            return Err(ProtocolError::Transport("no response".to_string()));
        }
        Ok(state.field_offices.get(hq).cloned().unwrap_or_default())
    }

    async fn list_field_office_sealed_bulletin_ids(
        &self,
        _hq: &AccountId,
        author: &AccountId,
        _tags: &[String],
    ) -> ProtocolResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.transport_down {
            return Err(ProtocolError::Transport("link down".to_string()));
        }
        Ok(state.manifests.get(author).cloned().unwrap_or_default())
    }

    async fn get_packet(
        &self,
        _hq: &AccountId,
        author: &AccountId,
        _bulletin: &LocalId,
        packet: &LocalId,
    ) -> ProtocolResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        if state.transport_down {
            return Err(ProtocolError::Transport("link down".to_string()));
        }
        state.packet_fetches += 1;
        state
            .packets
            .get(&(author.clone(), packet.clone()))
            .cloned()
            .ok_or_else(|| ProtocolError::Rejected("SERVER_ERROR".to_string()))
    }
}
