// Parley Atoms — Core types
// The data structures that flow through the whole client, plus the wire
// structs matching the backend's JSON. Independent of any transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Messages ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Sticker,
    File,
    Audio,
}

/// One turn in the conversation. Immutable once finalized; only the
/// currently-streaming assistant turn has its `content` rewritten in place
/// (see `transcript::Transcript`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>, kind: MessageKind) -> Self {
        ChatMessage {
            role,
            content: content.into(),
            kind,
            file_name: None,
            timestamp: Some(Utc::now()),
            attachments: Vec::new(),
        }
    }

    pub fn user_text(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, MessageKind::Text)
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, MessageKind::Text)
    }

    pub fn user_sticker(sticker: impl Into<String>) -> Self {
        Self::new(Role::User, sticker, MessageKind::Sticker)
    }

    /// A user turn describing an uploaded file, with the attachment record.
    pub fn user_file(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let mut msg = Self::new(Role::User, file_name.clone(), MessageKind::File);
        msg.attachments.push(Attachment {
            kind: AttachmentKind::File,
            locator: file_name.clone(),
            display_name: file_name.clone(),
        });
        msg.file_name = Some(file_name);
        msg
    }

    /// A user turn standing in for a recorded voice clip.
    pub fn user_audio(file_name: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::User, "[voice message]", MessageKind::Audio);
        msg.file_name = Some(file_name.into());
        msg
    }
}

/// A reference carried by exactly one message; never shared across turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// URL or data reference for the attachment payload.
    pub locator: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File,
    Sticker,
}

// ── User profile ───────────────────────────────────────────────────────

/// Profile as served by `GET /user`. Field names follow the backend JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub age: u32,
    pub profession: String,
    #[serde(rename = "phonenumber")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

// ── Wire structs ───────────────────────────────────────────────────────

/// `POST /login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Payload for `POST /signup` (sent as multipart form fields).
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub age: u32,
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub description: Option<String>,
    pub profile_picture: Option<ProfilePicture>,
}

/// Optional avatar sent with signup as the `profile_picture` part.
#[derive(Debug, Clone)]
pub struct ProfilePicture {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `POST /signup` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: String,
    pub token: String,
}

/// Single-shot reply body used by `/chat/voice` and `/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// One prior turn as returned by `GET /history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    /// Convert a history entry into a finalized text turn. Unknown roles
    /// are treated as user turns, matching how the backend stores them.
    pub fn into_message(self) -> ChatMessage {
        let role = match self.role.as_str() {
            "assistant" => Role::Assistant,
            _ => Role::User,
        };
        ChatMessage {
            role,
            content: self.content,
            kind: MessageKind::Text,
            file_name: None,
            timestamp: None,
            attachments: Vec::new(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn profile_uses_backend_field_names() {
        let json = r#"{
            "username": "ada",
            "email": "ada@example.com",
            "age": 29,
            "profession": "engineer",
            "phonenumber": "5551234",
            "description": null
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.phone, "5551234");
        assert!(profile.profile_picture.is_none());
    }

    #[test]
    fn history_entry_maps_unknown_role_to_user() {
        let entry = HistoryEntry {
            role: "system".into(),
            content: "hi".into(),
        };
        assert_eq!(entry.into_message().role, Role::User);
    }

    #[test]
    fn file_turn_owns_its_attachment() {
        let msg = ChatMessage::user_file("notes.pdf");
        assert_eq!(msg.kind, MessageKind::File);
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].display_name, "notes.pdf");
        assert_eq!(msg.file_name.as_deref(), Some("notes.pdf"));
    }
}
