//! Fieldpost - Bulletin Delivery Client
//!
//! A client library for field operatives submitting signed bulletins to a
//! remote server over an unreliable link, and for headquarters (HQ) accounts
//! retrieving the bulletins that field accounts have designated for them.
//!
//! Key principles:
//! - A bulletin leaves its delivery queue only on an explicit server OK for
//!   that exact bulletin, never on transport ambiguity
//! - Every retrieved packet is signature-verified against the authoring
//!   account's public key before its contents are trusted
//! - The protocol client is an injected capability, so both the upload
//!   engine and the retrieval catalog run against a deterministic in-memory
//!   server in tests

pub mod config;
pub mod crypto;
pub mod model;
pub mod protocol;
pub mod retrieve;
pub mod uploader;
