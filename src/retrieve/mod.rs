//! HQ retrieval catalog.
//!
//! Aggregates the multi-account manifest of bulletins that field offices
//! have designated for an HQ account, and resolves each row into
//! human-meaningful fields. Title and author are fetched lazily on first
//! read and verified against the authoring account's signature; a row whose
//! packet cannot be fetched or verified keeps blank fields but stays in the
//! catalog and stays selectable.

use thiserror::Error;

use crate::model::{AccountId, LocalId, UniversalId};
use crate::protocol::{PacketError, ProtocolClient, SignedPacket};

/// Fixed table shape: flag, title, author, size.
pub const COLUMN_COUNT: usize = 4;

/// Catalog columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Retrieve,
    Title,
    Author,
    Size,
}

impl Column {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Retrieve),
            1 => Some(Self::Title),
            2 => Some(Self::Author),
            3 => Some(Self::Size),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Title => "title",
            Self::Author => "author",
            Self::Size => "size",
        }
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Flag(bool),
    Text(String),
    Size(u64),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("row {0} out of range")]
    RowOutOfRange(usize),

    #[error("column {0} out of range")]
    ColumnOutOfRange(usize),
}

/// One retrievable bulletin, as described by the server manifest.
#[derive(Debug, Clone)]
pub struct RetrievalRow {
    author_account: AccountId,
    bulletin: LocalId,
    packet: LocalId,
    size: u64,
    flag: bool,
    details: RowDetails,
}

/// Lazily resolved title/author cache.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowDetails {
    Unresolved,
    Resolved { title: String, author: String },
    /// Fetch failed or the signature did not verify. The row is kept, with
    /// blank fields, and is not fetched again.
    Unverifiable,
}

impl RetrievalRow {
    pub fn universal_id(&self) -> UniversalId {
        UniversalId::new(self.author_account.clone(), self.bulletin.clone())
    }
}

/// Parse one manifest entry of the form `localId=fdpLocalId=sizeBytes`.
fn parse_manifest_entry(entry: &str) -> Option<(LocalId, LocalId, u64)> {
    let mut parts = entry.split('=');
    let bulletin = parts.next().filter(|s| !s.is_empty())?;
    let packet = parts.next().filter(|s| !s.is_empty())?;
    let size: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((LocalId(bulletin.to_string()), LocalId(packet.to_string()), size))
}

/// Selectable table of remote bulletins visible to one HQ account.
pub struct RetrievalCatalog<C> {
    client: C,
    hq: AccountId,
    rows: Vec<RetrievalRow>,
}

impl<C: ProtocolClient> RetrievalCatalog<C> {
    /// Build the catalog from the server's multi-account manifest.
    ///
    /// A failed or absent field-office listing yields an empty catalog; an
    /// empty catalog is a valid terminal state, not an error. A malformed
    /// manifest entry drops that single row; a failed manifest call skips
    /// that account only.
    pub async fn initialize(client: C, hq: AccountId) -> Self {
        let mut rows = Vec::new();

        let authors = match client.list_field_office_accounts(&hq).await {
            Ok(authors) => authors,
            Err(err) => {
                tracing::warn!(error = %err, "field office listing unavailable, catalog empty");
                Vec::new()
            }
        };

        for author in authors {
            let entries = match client
                .list_field_office_sealed_bulletin_ids(&hq, &author, &[])
                .await
            {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(account = %author, error = %err, "manifest unavailable, skipping account");
                    continue;
                }
            };
            for entry in entries {
                match parse_manifest_entry(&entry) {
                    Some((bulletin, packet, size)) => rows.push(RetrievalRow {
                        author_account: author.clone(),
                        bulletin,
                        packet,
                        size,
                        flag: false,
                        details: RowDetails::Unresolved,
                    }),
                    None => {
                        tracing::warn!(account = %author, entry = %entry, "dropping malformed manifest entry");
                    }
                }
            }
        }

        tracing::debug!(rows = rows.len(), "retrieval catalog initialized");
        Self { client, hq, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        COLUMN_COUNT
    }

    pub fn column_label(&self, column: usize) -> Option<&'static str> {
        Column::from_index(column).map(Column::label)
    }

    /// Only the retrieve flag is editable.
    pub fn is_cell_editable(&self, _row: usize, column: usize) -> bool {
        Column::from_index(column) == Some(Column::Retrieve)
    }

    /// Read one cell, resolving title/author from the server on first
    /// access.
    pub async fn value_at(&mut self, row: usize, column: usize) -> Result<CellValue, CatalogError> {
        let column = Column::from_index(column).ok_or(CatalogError::ColumnOutOfRange(column))?;
        if row >= self.rows.len() {
            return Err(CatalogError::RowOutOfRange(row));
        }
        match column {
            Column::Retrieve => Ok(CellValue::Flag(self.rows[row].flag)),
            Column::Size => Ok(CellValue::Size(self.rows[row].size)),
            Column::Title => {
                self.resolve_row(row).await;
                Ok(CellValue::Text(self.cached_title(row)))
            }
            Column::Author => {
                self.resolve_row(row).await;
                Ok(CellValue::Text(self.cached_author(row)))
            }
        }
    }

    /// Write one cell. Only the flag column accepts writes; anything else is
    /// silently ignored and the prior value stays intact.
    pub fn set_value_at(&mut self, value: CellValue, row: usize, column: usize) {
        if Column::from_index(column) != Some(Column::Retrieve) {
            return;
        }
        let (Some(row), CellValue::Flag(flag)) = (self.rows.get_mut(row), value) else {
            return;
        };
        row.flag = flag;
    }

    /// Set every row's retrieve flag uniformly.
    pub fn set_all_flags(&mut self, flag: bool) {
        for row in &mut self.rows {
            row.flag = flag;
        }
    }

    /// Identities of all flagged rows, in catalog row order.
    pub fn selected_universal_ids(&self) -> Vec<UniversalId> {
        self.rows
            .iter()
            .filter(|row| row.flag)
            .map(RetrievalRow::universal_id)
            .collect()
    }

    pub fn flag_at(&self, row: usize) -> Option<bool> {
        self.rows.get(row).map(|r| r.flag)
    }

    pub fn size_at(&self, row: usize) -> Option<u64> {
        self.rows.get(row).map(|r| r.size)
    }

    /// Whether the row's packet failed fetch or verification.
    pub fn is_unverifiable(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map(|r| r.details == RowDetails::Unverifiable)
            .unwrap_or(false)
    }

    /// Fetch and verify the row's field data packet once; cache the result
    /// either way. Verification failure never removes the row.
    async fn resolve_row(&mut self, row: usize) {
        if self.rows[row].details != RowDetails::Unresolved {
            return;
        }
        let (author, bulletin, packet) = {
            let r = &self.rows[row];
            (r.author_account.clone(), r.bulletin.clone(), r.packet.clone())
        };

        let details = match self
            .client
            .get_packet(&self.hq, &author, &bulletin, &packet)
            .await
        {
            Ok(bytes) => match SignedPacket::open(&bytes, &author) {
                Ok(fdp) => RowDetails::Resolved {
                    title: fdp.title,
                    author: fdp.author,
                },
                Err(PacketError::BadSignature) => {
                    tracing::warn!(account = %author, bulletin = %bulletin, "packet signature did not verify");
                    RowDetails::Unverifiable
                }
                Err(err) => {
                    tracing::warn!(account = %author, bulletin = %bulletin, error = %err, "packet unreadable");
                    RowDetails::Unverifiable
                }
            },
            Err(err) => {
                tracing::warn!(account = %author, bulletin = %bulletin, error = %err, "packet fetch failed");
                RowDetails::Unverifiable
            }
        };
        self.rows[row].details = details;
    }

    fn cached_title(&self, row: usize) -> String {
        match &self.rows[row].details {
            RowDetails::Resolved { title, .. } => title.clone(),
            _ => String::new(),
        }
    }

    fn cached_author(&self, row: usize) -> String {
        match &self.rows[row].details {
            RowDetails::Resolved { author, .. } => author.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_well_formed_entry() {
        let (bulletin, packet, size) = parse_manifest_entry("B-1=F-B-1=2048").unwrap();
        assert_eq!(bulletin, LocalId("B-1".into()));
        assert_eq!(packet, LocalId("F-B-1".into()));
        assert_eq!(size, 2048);
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(parse_manifest_entry("").is_none());
        assert!(parse_manifest_entry("B-1").is_none());
        assert!(parse_manifest_entry("B-1=F-B-1").is_none());
        assert!(parse_manifest_entry("B-1=F-B-1=big").is_none());
        assert!(parse_manifest_entry("B-1=F-B-1=10=extra").is_none());
        assert!(parse_manifest_entry("=F-B-1=10").is_none());
        assert!(parse_manifest_entry("B-1==10").is_none());
    }

    #[test]
    fn column_index_mapping_is_total_over_the_table() {
        assert_eq!(Column::from_index(0), Some(Column::Retrieve));
        assert_eq!(Column::from_index(3), Some(Column::Size));
        assert_eq!(Column::from_index(4), None);
    }

    proptest! {
        #[test]
        fn parse_round_trips_ids_without_equals(
            bulletin in "[A-Za-z0-9-]{1,16}",
            packet in "[A-Za-z0-9-]{1,16}",
            size in 0u64..u64::MAX,
        ) {
            let entry = format!("{bulletin}={packet}={size}");
            let (b, p, s) = parse_manifest_entry(&entry).unwrap();
            prop_assert_eq!(b.0, bulletin);
            prop_assert_eq!(p.0, packet);
            prop_assert_eq!(s, size);
        }

        #[test]
        fn parse_never_panics(entry in ".{0,64}") {
            let _ = parse_manifest_entry(&entry);
        }
    }
}
