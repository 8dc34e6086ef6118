//! Office chat: a shared message history polled by every desk, plus a
//! sticky note pinned above it.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{JsonDocument, JsonStore, Record, now_iso, timestamp_id};
use crate::upload::{StoredFile, Uploads};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub ip: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: String,
    pub sender_name: String,
    #[serde(default)]
    pub attachment: Option<StoredFile>,
}

impl Record for ChatMessage {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Pick the client address: the first `X-Forwarded-For` entry, else the
/// socket peer, else loopback.
pub fn client_ip(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or(peer)
        .unwrap_or("127.0.0.1")
        .to_string()
}

/// `User .<last octet>` for dotted addresses, `User Local` otherwise.
pub fn sender_name(ip: &str) -> String {
    let segments: Vec<&str> = ip.split('.').collect();
    match segments.as_slice() {
        [.., last] if segments.len() > 1 => format!("User .{}", last),
        _ => "User Local".to_string(),
    }
}

/// A file attached to an outgoing message.
pub struct Attachment<'a> {
    pub file_name: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Append a message, keeping only the newest `limit` messages.
///
/// A message needs text or a non-empty attachment. An attachment that fails
/// to upload is dropped; the message is still sent if it has text.
pub fn send_message(
    store: &JsonStore<ChatMessage>,
    uploads: &Uploads,
    ip: &str,
    text: &str,
    attachment: Option<Attachment<'_>>,
    limit: usize,
) -> Result<ChatMessage> {
    let attachment = attachment.filter(|a| !a.bytes.is_empty());
    if text.trim().is_empty() && attachment.is_none() {
        return Err(AppError::invalid("message or file is required"));
    }

    let stored = match attachment {
        Some(file) => match uploads.store("chat", file.file_name, file.content_type, file.bytes) {
            Ok(stored) => Some(stored),
            Err(e) => {
                log::warn!("chat attachment {:?} dropped: {}", file.file_name, e);
                if text.trim().is_empty() {
                    return Err(e);
                }
                None
            }
        },
        None => None,
    };

    let message = ChatMessage {
        id: timestamp_id(),
        ip: ip.to_string(),
        message: text.to_string(),
        timestamp: now_iso(),
        sender_name: sender_name(ip),
        attachment: stored,
    };

    store.update(|messages| {
        messages.push(message.clone());
        let excess = messages.len().saturating_sub(limit);
        messages.drain(..excess);
        Ok(message)
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StickyNote {
    pub content: String,
    pub updated_at: String,
    pub updated_by: String,
}

pub fn note_document(data_dir: &std::path::Path) -> JsonDocument<StickyNote> {
    JsonDocument::new(data_dir, "chat-note.json", StickyNote::default)
}

pub fn save_note(doc: &JsonDocument<StickyNote>, content: &str, ip: &str) -> Result<StickyNote> {
    let note = StickyNote {
        content: content.to_string(),
        updated_at: now_iso(),
        updated_by: sender_name(ip),
    };
    doc.save(&note)?;
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_selection() {
        assert_eq!(client_ip(Some("10.0.0.7, 172.16.0.1"), Some("192.168.1.2")), "10.0.0.7");
        assert_eq!(client_ip(None, Some("192.168.1.2")), "192.168.1.2");
        assert_eq!(client_ip(Some(""), None), "127.0.0.1");
    }

    #[test]
    fn sender_names() {
        assert_eq!(sender_name("192.168.1.23"), "User .23");
        assert_eq!(sender_name("::ffff:10.0.0.4"), "User .4");
        assert_eq!(sender_name("::1"), "User Local");
    }

    #[test]
    fn history_is_trimmed_to_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data"), "chat-history.json");
        let uploads = Uploads::new(dir.path().join("public"), 1024);
        for i in 0..5 {
            send_message(&store, &uploads, "192.168.1.9", &format!("pesan {}", i), None, 3).unwrap();
        }
        let history = store.list();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].message, "pesan 2");
        assert_eq!(history[2].sender_name, "User .9");
    }

    #[test]
    fn blank_message_needs_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data"), "chat-history.json");
        let uploads = Uploads::new(dir.path().join("public"), 1024);
        assert!(send_message(&store, &uploads, "::1", "  ", None, 10).is_err());

        let empty = Attachment {
            file_name: "kosong.txt",
            content_type: None,
            bytes: b"",
        };
        assert!(send_message(&store, &uploads, "::1", "", Some(empty), 10).is_err());

        let scan = Attachment {
            file_name: "scan ktp.jpg",
            content_type: Some("image/jpeg"),
            bytes: b"\xff\xd8\xff",
        };
        let sent = send_message(&store, &uploads, "::1", "", Some(scan), 10).unwrap();
        let file = sent.attachment.unwrap();
        assert!(file.file_url.starts_with("/uploads/chat/"));
        assert!(file.file_url.ends_with("-scan_ktp.jpg"));
        assert_eq!(file.file_name, "scan ktp.jpg");
    }

    #[test]
    fn note_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let doc = note_document(dir.path());
        assert_eq!(doc.get(), StickyNote::default());
        save_note(&doc, "Rapat jam 10", "192.168.1.5").unwrap();
        let note = doc.get();
        assert_eq!(note.content, "Rapat jam 10");
        assert_eq!(note.updated_by, "User .5");
    }
}
