// Parley — Chat endpoints
// /chat streams its reply as a plain text body; /chat/voice and /upload
// answer with a single `{response}` JSON payload; /history returns the
// stored conversation.

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use log::debug;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::{http, ApiClient};
use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::types::{ChatResponse, HistoryEntry};

impl ApiClient {
    /// `POST /chat` — returns the live byte stream of the reply body.
    /// The caller drains it through `stream::drain_into`; dropping the
    /// stream stops the read.
    pub async fn send_chat(
        &self,
        prompt: &str,
    ) -> ClientResult<impl Stream<Item = Result<Bytes, ClientError>>> {
        debug!("[chat] prompt ({} chars)", prompt.len());
        let response = self
            .authorize(self.http.post(self.url("/chat")))
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.bytes_stream().map_err(ClientError::Network))
    }

    /// `POST /chat/voice` — multipart `audio_file` upload of a finished
    /// clip; the reply is the transcribed/assistant text.
    pub async fn send_voice(&self, wav: Vec<u8>, file_name: &str) -> ClientResult<ChatResponse> {
        debug!("[chat] voice upload {} ({} bytes)", file_name, wav.len());
        let part = Part::bytes(wav)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let form = Form::new().part("audio_file", part);

        let response = self
            .authorize(self.http.post(self.url("/chat/voice")))
            .multipart(form)
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// `POST /upload` — multipart `file` plus an optional `prompt` field.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        prompt: Option<&str>,
    ) -> ClientResult<ChatResponse> {
        debug!("[chat] file upload {} ({} bytes)", file_name, bytes.len());
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = Form::new().part("file", part);
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let response = self
            .authorize(self.http.post(self.url("/upload")))
            .multipart(form)
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// `GET /history` — prior turns, oldest first.
    pub async fn history(&self) -> ClientResult<Vec<HistoryEntry>> {
        let response = self
            .authorize(self.http.get(self.url("/history")))
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}
