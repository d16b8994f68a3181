// Parley — Conversation controller
//
// Binds the transcript to the API client: every user action appends its
// user turn, issues the request, and lands the assistant turn. All send
// operations take `&mut self`, so exchanges are serialized — a second
// submission cannot start while a stream is being drained.
//
// Error policy: failures are returned to the caller to surface as a
// transient notice; the turns appended so far stay in the transcript
// (including a partial streamed reply).

use log::info;

use crate::atoms::error::ClientResult;
use crate::atoms::types::ChatMessage;
use crate::client::ApiClient;
use crate::recorder;
use crate::stream;
use crate::transcript::Transcript;

pub const VOICE_FILE_NAME: &str = "voice-message.wav";

pub struct Conversation {
    api: ApiClient,
    transcript: Transcript,
}

impl Conversation {
    pub fn new(api: ApiClient) -> Self {
        Conversation {
            api,
            transcript: Transcript::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut ApiClient {
        &mut self.api
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send a text prompt and stream the reply into the transcript.
    ///
    /// Blank or whitespace-only input appends nothing and returns
    /// `Ok(None)`. On success returns the complete reply; `on_delta` fires
    /// with each newly decoded piece as it arrives.
    pub async fn send_text<F>(&mut self, prompt: &str, on_delta: F) -> ClientResult<Option<String>>
    where
        F: FnMut(&str),
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(None);
        }

        self.transcript.append(ChatMessage::user_text(prompt));
        let chunks = self.api.send_chat(prompt).await?;
        let reply = stream::drain_into(&mut self.transcript, chunks, on_delta).await?;
        Ok(Some(reply))
    }

    /// Append a sticker turn. Stickers are local-only — no request.
    pub fn send_sticker(&mut self, sticker: &str) {
        self.transcript.append(ChatMessage::user_sticker(sticker));
    }

    /// Upload a file with an optional prompt. Appends one user file turn
    /// and one assistant turn carrying the reply.
    pub async fn send_file(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        prompt: Option<&str>,
    ) -> ClientResult<String> {
        self.transcript.append(ChatMessage::user_file(file_name));
        let response = self.api.upload_file(file_name, bytes, prompt).await?;
        self.transcript
            .append(ChatMessage::assistant_text(&response.response));
        Ok(response.response)
    }

    /// Send a finished voice clip. Appends one user audio turn and one
    /// assistant turn carrying the transcribed/assistant reply.
    pub async fn send_voice(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> ClientResult<String> {
        let wav = recorder::samples_to_wav(samples, sample_rate)?;
        self.transcript.append(ChatMessage::user_audio(VOICE_FILE_NAME));
        let response = self.api.send_voice(wav, VOICE_FILE_NAME).await?;
        self.transcript
            .append(ChatMessage::assistant_text(&response.response));
        Ok(response.response)
    }

    /// Replace the transcript with the backend's stored history.
    pub async fn load_history(&mut self) -> ClientResult<usize> {
        let entries = self.api.history().await?;
        let count = entries.len();
        self.transcript
            .load(entries.into_iter().map(|e| e.into_message()).collect());
        info!("[convo] loaded {} prior turn(s)", count);
        Ok(count)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::{MessageKind, Role};

    fn convo() -> Conversation {
        // Nothing listens on this port; tests below never reach the network.
        Conversation::new(ApiClient::new("http://127.0.0.1:9"))
    }

    #[tokio::test]
    async fn blank_submission_appends_nothing() {
        let mut c = convo();
        assert!(c.send_text("", |_| {}).await.unwrap().is_none());
        assert!(c.send_text("   \t\n", |_| {}).await.unwrap().is_none());
        assert!(c.transcript().is_empty());
    }

    #[tokio::test]
    async fn failed_send_keeps_the_user_turn() {
        let mut c = convo();
        let result = c.send_text("hello?", |_| {}).await;
        assert!(result.is_err());
        assert_eq!(c.transcript().len(), 1);
        let turn = c.transcript().last().unwrap();
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hello?");
    }

    #[test]
    fn sticker_is_local_only() {
        let mut c = convo();
        c.send_sticker("🎸");
        assert_eq!(c.transcript().len(), 1);
        let turn = c.transcript().last().unwrap();
        assert_eq!(turn.kind, MessageKind::Sticker);
        assert_eq!(turn.content, "🎸");
    }

    #[tokio::test]
    async fn empty_voice_clip_fails_before_any_append() {
        let mut c = convo();
        assert!(c.send_voice(&[], 16_000).await.is_err());
        assert!(c.transcript().is_empty());
    }
}
