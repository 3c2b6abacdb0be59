//! Signed packet framing.
//!
//! A field data packet carries the human-meaningful fields of a bulletin
//! (title, author). It travels as a [`SignedPacket`]: the JSON payload plus
//! an Ed25519 signature over the payload bytes, made with the authoring
//! account's key. Opening a packet verifies the signature before the payload
//! is parsed, so unverified content never reaches a caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{self, AccountKey};
use crate::model::{AccountId, Bulletin, LocalId};

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet signature did not verify")]
    BadSignature,

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("packet payload could not be serialized: {0}")]
    Serialize(String),
}

/// The signed content payload of a bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDataPacket {
    pub account: AccountId,
    pub local_id: LocalId,
    pub title: String,
    pub author: String,
}

impl FieldDataPacket {
    /// Derive the content packet of a bulletin. The packet gets its own
    /// local id so the server can address it independently of the bulletin.
    pub fn for_bulletin(bulletin: &Bulletin) -> Self {
        Self {
            account: bulletin.id.account.clone(),
            local_id: packet_local_id(&bulletin.id.local),
            title: bulletin.title.clone(),
            author: bulletin.author.clone(),
        }
    }
}

/// Local id of the field data packet belonging to a bulletin.
pub fn packet_local_id(bulletin_local_id: &LocalId) -> LocalId {
    LocalId(format!("F-{}", bulletin_local_id.0))
}

/// Envelope: payload JSON plus hex Ed25519 signature over the payload bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedPacket {
    pub payload: String,
    pub signature: String,
}

impl SignedPacket {
    /// Sign a field data packet with the author's key and serialize the
    /// envelope to bytes.
    pub fn seal(packet: &FieldDataPacket, key: &AccountKey) -> Result<Vec<u8>, PacketError> {
        let payload =
            serde_json::to_string(packet).map_err(|e| PacketError::Serialize(e.to_string()))?;
        let signature = hex::encode(key.sign(payload.as_bytes()));
        let envelope = Self { payload, signature };
        serde_json::to_vec(&envelope).map_err(|e| PacketError::Serialize(e.to_string()))
    }

    /// Parse an envelope, verify its signature against the authoring
    /// account, and return the payload.
    pub fn open(bytes: &[u8], author: &AccountId) -> Result<FieldDataPacket, PacketError> {
        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| PacketError::Malformed(format!("envelope: {e}")))?;
        let signature = hex::decode(&envelope.signature)
            .map_err(|e| PacketError::Malformed(format!("signature encoding: {e}")))?;
        crypto::verify(author, envelope.payload.as_bytes(), &signature)
            .map_err(|_| PacketError::BadSignature)?;
        let packet: FieldDataPacket = serde_json::from_str(&envelope.payload)
            .map_err(|e| PacketError::Malformed(format!("payload: {e}")))?;
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UniversalId;

    fn fixture() -> (AccountKey, FieldDataPacket) {
        let key = AccountKey::generate().unwrap();
        let bulletin = Bulletin::new(
            UniversalId::new(key.account_id().clone(), LocalId("B-1".into())),
            "cool title",
            "Fred 0",
        );
        (key, FieldDataPacket::for_bulletin(&bulletin))
    }

    #[test]
    fn seal_then_open_returns_payload() {
        let (key, packet) = fixture();
        let bytes = SignedPacket::seal(&packet, &key).unwrap();
        let opened = SignedPacket::open(&bytes, key.account_id()).unwrap();
        assert_eq!(opened, packet);
    }

    #[test]
    fn open_rejects_wrong_author() {
        let (key, packet) = fixture();
        let other = AccountKey::generate().unwrap();
        let bytes = SignedPacket::seal(&packet, &key).unwrap();
        let err = SignedPacket::open(&bytes, other.account_id()).unwrap_err();
        assert!(matches!(err, PacketError::BadSignature));
    }

    #[test]
    fn open_rejects_tampered_payload() {
        let (key, packet) = fixture();
        let bytes = SignedPacket::seal(&packet, &key).unwrap();
        let mut envelope: SignedPacket = serde_json::from_slice(&bytes).unwrap();
        envelope.payload = envelope.payload.replace("cool title", "forged title");
        let tampered = serde_json::to_vec(&envelope).unwrap();
        let err = SignedPacket::open(&tampered, key.account_id()).unwrap_err();
        assert!(matches!(err, PacketError::BadSignature));
    }

    #[test]
    fn open_rejects_garbage_bytes() {
        let key = AccountKey::generate().unwrap();
        let err = SignedPacket::open(b"not an envelope", key.account_id()).unwrap_err();
        assert!(matches!(err, PacketError::Malformed(_)));
    }

    #[test]
    fn packet_local_id_is_stable() {
        assert_eq!(packet_local_id(&LocalId("B-9".into())), LocalId("F-B-9".into()));
    }
}
