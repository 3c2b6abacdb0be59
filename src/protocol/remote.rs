//! Real transport: line-delimited JSON over TCP.
//!
//! Each operation opens a connection, writes one request line, and reads one
//! response line. Transient transport failures are retried here with backoff
//! so callers only ever see the final outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::retry::retry_with_backoff;
use super::traits::{ProtocolClient, ProtocolError, ProtocolResult, UploadStatus};
use crate::model::{AccountId, LocalId};

/// Status string a healthy server answers with.
const STATUS_OK: &str = "ok";

/// Protocol client over a TCP endpoint.
#[derive(Clone)]
pub struct RemoteClient {
    address: String,
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    UploadBulletin {
        account: &'a str,
        packaged: String,
    },
    ListFieldOfficeAccounts {
        hq: &'a str,
    },
    ListFieldOfficeSealedBulletinIds {
        hq: &'a str,
        author: &'a str,
        tags: &'a [String],
    },
    GetPacket {
        hq: &'a str,
        author: &'a str,
        bulletin: &'a str,
        packet: &'a str,
    },
}

#[derive(Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    accounts: Vec<String>,
    #[serde(default)]
    entries: Vec<String>,
    #[serde(default)]
    packet: Option<String>,
}

impl RemoteClient {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    async fn call(&self, request: &Request<'_>) -> ProtocolResult<Response> {
        retry_with_backoff(|| self.call_once(request)).await
    }

    async fn call_once(&self, request: &Request<'_>) -> ProtocolResult<Response> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| ProtocolError::Malformed(format!("request encoding: {e}")))?;
        line.push('\n');

        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        let (read_half, mut write_half) = stream.into_split();

        write_half
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        write_half
            .shutdown()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        let mut reply = String::new();
        let mut reader = BufReader::new(read_half);
        let read = reader
            .read_line(&mut reply)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        if read == 0 {
            return Err(ProtocolError::Transport("connection closed".to_string()));
        }

        serde_json::from_str(&reply)
            .map_err(|e| ProtocolError::Malformed(format!("response: {e}")))
    }
}

#[async_trait]
impl ProtocolClient for RemoteClient {
    async fn upload_bulletin(
        &self,
        account: &AccountId,
        packaged: &[u8],
    ) -> ProtocolResult<UploadStatus> {
        let response = self
            .call(&Request::UploadBulletin {
                account: &account.0,
                packaged: hex::encode(packaged),
            })
            .await?;
        if response.status == STATUS_OK {
            Ok(UploadStatus::Ok)
        } else {
            Ok(UploadStatus::Rejected(response.status))
        }
    }

    async fn list_field_office_accounts(&self, hq: &AccountId) -> ProtocolResult<Vec<AccountId>> {
        let response = self.call(&Request::ListFieldOfficeAccounts { hq: &hq.0 }).await?;
        if response.status != STATUS_OK {
            return Err(ProtocolError::Rejected(response.status));
        }
        Ok(response.accounts.into_iter().map(AccountId).collect())
    }

    async fn list_field_office_sealed_bulletin_ids(
        &self,
        hq: &AccountId,
        author: &AccountId,
        tags: &[String],
    ) -> ProtocolResult<Vec<String>> {
        let response = self
            .call(&Request::ListFieldOfficeSealedBulletinIds {
                hq: &hq.0,
                author: &author.0,
                tags,
            })
            .await?;
        if response.status != STATUS_OK {
            return Err(ProtocolError::Rejected(response.status));
        }
        Ok(response.entries)
    }

    async fn get_packet(
        &self,
        hq: &AccountId,
        author: &AccountId,
        bulletin: &LocalId,
        packet: &LocalId,
    ) -> ProtocolResult<Vec<u8>> {
        let response = self
            .call(&Request::GetPacket {
                hq: &hq.0,
                author: &author.0,
                bulletin: &bulletin.0,
                packet: &packet.0,
            })
            .await?;
        if response.status != STATUS_OK {
            return Err(ProtocolError::Rejected(response.status));
        }
        let packet_hex = response
            .packet
            .ok_or_else(|| ProtocolError::Malformed("missing packet field".to_string()))?;
        hex::decode(&packet_hex)
            .map_err(|e| ProtocolError::Malformed(format!("packet encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// One-shot server that answers a fixed JSON line.
    async fn answer_once(listener: TcpListener, reply: &'static str) {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        socket.read_to_end(&mut request).await.unwrap();
        assert!(!request.is_empty());
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.write_all(b"\n").await.unwrap();
    }

    #[tokio::test]
    async fn upload_parses_ok_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(answer_once(listener, r#"{"status":"ok"}"#));

        let client = RemoteClient::new(&address);
        let status = client
            .upload_bulletin(&AccountId("field".into()), b"bytes")
            .await
            .unwrap();
        assert_eq!(status, UploadStatus::Ok);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn upload_surfaces_rejection_tag() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(answer_once(listener, r#"{"status":"QUOTA_EXCEEDED"}"#));

        let client = RemoteClient::new(&address);
        let status = client
            .upload_bulletin(&AccountId("field".into()), b"bytes")
            .await
            .unwrap();
        assert_eq!(status, UploadStatus::Rejected("QUOTA_EXCEEDED".to_string()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn listing_decodes_accounts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(answer_once(
            listener,
            r#"{"status":"ok","accounts":["aa","bb"]}"#,
        ));

        let client = RemoteClient::new(&address);
        let accounts = client
            .list_field_office_accounts(&AccountId("hq".into()))
            .await
            .unwrap();
        assert_eq!(accounts, vec![AccountId("aa".into()), AccountId("bb".into())]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn get_packet_decodes_hex_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(answer_once(
            listener,
            r#"{"status":"ok","packet":"68656c6c6f"}"#,
        ));

        let client = RemoteClient::new(&address);
        let bytes = client
            .get_packet(
                &AccountId("hq".into()),
                &AccountId("field".into()),
                &LocalId("B-1".into()),
                &LocalId("F-B-1".into()),
            )
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");
        server.await.unwrap();
    }
}
