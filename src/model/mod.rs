//! Core data model: account/bulletin identities, bulletins, and the local
//! delivery folders.
//!
//! Everything here is pure data. Folder membership rules are enforced by
//! [`store::ClientStore`], which is the only type allowed to move a bulletin
//! between folders.

pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account identity. The string is the hex-encoded Ed25519 public key of the
/// account, so knowing an account id is sufficient to verify its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-account unique identifier of a bulletin or packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(pub String);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique, immutable identity of a bulletin across all accounts and
/// servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniversalId {
    pub account: AccountId,
    pub local: LocalId,
}

impl UniversalId {
    pub fn new(account: AccountId, local: LocalId) -> Self {
        Self { account, local }
    }
}

impl fmt::Display for UniversalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account, self.local)
    }
}

/// Bulletin lifecycle state.
///
/// Sealed content is cryptographically finalized and immutable; a draft may
/// be modified and resubmitted indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletinStatus {
    Draft,
    Sealed,
}

/// A signed document unit exchanged between accounts and the server.
///
/// Only the attributes consumed by the upload engine and retrieval catalog
/// live here; content persistence and zip packaging are the enclosing
/// application's concern.
#[derive(Debug, Clone)]
pub struct Bulletin {
    pub id: UniversalId,
    pub status: BulletinStatus,
    pub title: String,
    pub author: String,
    /// HQ account allowed to retrieve this bulletin, if any.
    pub hq: Option<AccountId>,
}

impl Bulletin {
    pub fn new(id: UniversalId, title: &str, author: &str) -> Self {
        Self {
            id,
            status: BulletinStatus::Draft,
            title: title.to_string(),
            author: author.to_string(),
            hq: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.status == BulletinStatus::Sealed
    }

    pub fn is_draft(&self) -> bool {
        self.status == BulletinStatus::Draft
    }

    pub fn set_sealed(&mut self) {
        self.status = BulletinStatus::Sealed;
    }

    pub fn set_draft(&mut self) {
        self.status = BulletinStatus::Draft;
    }
}

/// A named ordered collection of bulletin references.
#[derive(Debug, Clone, Default)]
pub struct Folder {
    ids: Vec<UniversalId>,
}

impl Folder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reference. Re-adding an existing member is a no-op so a
    /// bulletin can never be queued twice.
    pub fn add(&mut self, id: UniversalId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Remove a reference. Returns whether it was a member.
    pub fn remove(&mut self, id: &UniversalId) -> bool {
        match self.ids.iter().position(|m| m == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Oldest entry, next in line for delivery.
    pub fn front(&self) -> Option<&UniversalId> {
        self.ids.first()
    }

    pub fn contains(&self, id: &UniversalId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniversalId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u8) -> UniversalId {
        UniversalId::new(AccountId("acct".to_string()), LocalId(format!("B-{n}")))
    }

    #[test]
    fn folder_preserves_insertion_order() {
        let mut folder = Folder::new();
        folder.add(uid(1));
        folder.add(uid(2));
        folder.add(uid(3));

        assert_eq!(folder.front(), Some(&uid(1)));
        let collected: Vec<_> = folder.iter().cloned().collect();
        assert_eq!(collected, vec![uid(1), uid(2), uid(3)]);
    }

    #[test]
    fn folder_rejects_duplicates() {
        let mut folder = Folder::new();
        folder.add(uid(1));
        folder.add(uid(1));
        assert_eq!(folder.len(), 1);
    }

    #[test]
    fn folder_remove_reports_membership() {
        let mut folder = Folder::new();
        folder.add(uid(1));
        assert!(folder.remove(&uid(1)));
        assert!(!folder.remove(&uid(1)));
        assert!(folder.is_empty());
    }

    #[test]
    fn bulletin_status_transitions() {
        let mut b = Bulletin::new(uid(1), "title", "author");
        assert!(b.is_draft());
        b.set_sealed();
        assert!(b.is_sealed());
        assert!(!b.is_draft());
    }
}
