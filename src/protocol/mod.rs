//! Protocol client abstraction and implementations.
//!
//! The upload engine and retrieval catalog depend only on the
//! [`ProtocolClient`] trait. Two implementations live here:
//! - [`MockServer`]: deterministic in-memory server for tests
//! - [`RemoteClient`]: line-delimited JSON over TCP, with transport-level
//!   retry
//!
//! Signed packet framing ([`packet`]) is shared by both directions: the
//! engine seals packets for upload, the catalog opens and verifies fetched
//! packets.

pub mod mock;
pub mod packet;
pub mod remote;
pub mod retry;
pub mod traits;

pub use mock::MockServer;
pub use packet::{FieldDataPacket, PacketError, SignedPacket};
pub use remote::RemoteClient;
pub use traits::{ProtocolClient, ProtocolError, ProtocolResult, UploadStatus};
