// Parley — Streaming reply assembler
//
// Turns the byte chunks of one open `/chat` response into incremental
// transcript updates, then settles the turn when the stream ends.
//
// Chunk boundaries are arbitrary: the backend may split a multi-byte UTF-8
// character across two network reads, so decoding goes through a small
// incremental decoder that carries the partial sequence into the next chunk
// instead of emitting replacement characters at every boundary.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::debug;

use crate::atoms::error::{ClientError, ClientResult};
use crate::transcript::Transcript;

// ── Incremental UTF-8 decoding ─────────────────────────────────────────

/// Decodes a byte stream as UTF-8 across arbitrary chunk boundaries.
///
/// A trailing incomplete multi-byte sequence is buffered until the next
/// chunk completes it. Genuinely invalid bytes are replaced with U+FFFD —
/// decoding never fails.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Utf8ChunkDecoder::default()
    }

    /// Decode the next chunk, returning the completed text.
    pub fn decode(&mut self, input: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(input);

        let keep = incomplete_suffix_len(&buf);
        let split = buf.len() - keep;
        self.pending = buf.split_off(split);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Flush any buffered partial sequence at end of stream. A truncated
    /// character decodes lossily rather than being dropped.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&tail).into_owned()
    }
}

/// Length of a trailing multi-byte sequence that is still missing bytes.
/// Returns 0 when the buffer ends on a character boundary (or on bytes that
/// are invalid outright and should be replaced now).
fn incomplete_suffix_len(buf: &[u8]) -> usize {
    // A UTF-8 sequence is at most 4 bytes, so only the last 3 can start one
    // that is cut off.
    for back in 1..=buf.len().min(3) {
        let byte = buf[buf.len() - back];
        let needed = match byte {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            // Continuation or invalid lead byte: keep scanning backwards.
            _ => continue,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

// ── Assembler ──────────────────────────────────────────────────────────

/// Accumulates decoded chunks into the full reply text.
///
/// `push` returns the newly decoded piece; `text` is always the complete
/// accumulation so far. Dropping the assembler mid-stream simply discards
/// the buffered partial byte sequence — nothing else is mutated.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    decoder: Utf8ChunkDecoder,
    accumulated: String,
}

impl StreamAssembler {
    pub fn new() -> Self {
        StreamAssembler::default()
    }

    /// Feed the next chunk; returns the text it contributed.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        let piece = self.decoder.decode(chunk);
        self.accumulated.push_str(&piece);
        piece
    }

    /// The full accumulated reply so far.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// End of stream: flush the decoder and take the final text.
    pub fn finish(mut self) -> String {
        let tail = self.decoder.finish();
        self.accumulated.push_str(&tail);
        self.accumulated
    }
}

// ── Drain loop ─────────────────────────────────────────────────────────

/// Pull chunks off `stream` until it ends, updating the transcript tail
/// after every chunk and invoking `on_delta` with each newly decoded piece
/// (the CLI prints these as they arrive).
///
/// Chunks are applied strictly in arrival order. On a mid-stream error the
/// partial reply is finalized in place and the error is returned — nothing
/// is rolled back. Returns the complete reply text on success.
pub async fn drain_into<S, F>(
    transcript: &mut Transcript,
    stream: S,
    mut on_delta: F,
) -> ClientResult<String>
where
    S: Stream<Item = Result<Bytes, ClientError>>,
    F: FnMut(&str),
{
    futures::pin_mut!(stream);

    let mut assembler = StreamAssembler::new();
    let mut chunks_seen = 0usize;
    let outcome = loop {
        match stream.next().await {
            Some(Ok(chunk)) => {
                chunks_seen += 1;
                let piece = assembler.push(&chunk);
                transcript.apply_assistant_chunk(assembler.text());
                if !piece.is_empty() {
                    on_delta(&piece);
                }
            }
            Some(Err(err)) => break Err(err),
            None => break Ok(()),
        }
    };

    let reply = assembler.finish();
    // A flushed partial sequence (or a zero-chunk stream) may leave the
    // transcript behind the final text.
    if !reply.is_empty() || chunks_seen > 0 {
        transcript.apply_assistant_chunk(&reply);
    }
    transcript.finalize_stream();

    debug!(
        "[stream] drained {} chunk(s), {} byte(s) of reply",
        chunks_seen,
        reply.len()
    );

    outcome.map(|_| reply)
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::Role;
    use futures::stream;

    fn ok_chunks(parts: &[&[u8]]) -> Vec<Result<Bytes, ClientError>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect()
    }

    #[tokio::test]
    async fn hello_world_scenario() {
        let mut t = Transcript::new();
        let chunks = ok_chunks(&[b"Hel", b"lo, ", b"world"]);

        let reply = drain_into(&mut t, stream::iter(chunks), |_| {})
            .await
            .unwrap();

        assert_eq!(reply, "Hello, world");
        assert_eq!(t.len(), 1);
        let tail = t.last().unwrap();
        assert_eq!(tail.role, Role::Assistant);
        assert_eq!(tail.content, "Hello, world");
    }

    #[tokio::test]
    async fn final_text_is_chunk_boundary_independent() {
        let full = "héllo wörld — ßtream ✓";
        let bytes = full.as_bytes();

        // Split at every position, including mid-character.
        for split in 0..=bytes.len() {
            let mut t = Transcript::new();
            let chunks = ok_chunks(&[&bytes[..split], &bytes[split..]]);
            let reply = drain_into(&mut t, stream::iter(chunks), |_| {})
                .await
                .unwrap();
            assert_eq!(reply, full, "split at byte {}", split);
            assert_eq!(t.len(), 1);
            assert_eq!(t.last().unwrap().content, full);
        }
    }

    #[tokio::test]
    async fn one_stream_appends_exactly_one_assistant_turn() {
        let mut t = Transcript::new();
        t.append(crate::atoms::types::ChatMessage::user_text("question"));

        let parts: Vec<&[u8]> = vec![b"a"; 50];
        let chunks = ok_chunks(&parts);
        drain_into(&mut t, stream::iter(chunks), |_| {})
            .await
            .unwrap();

        assert_eq!(t.len(), 2);
        assert_eq!(t.last().unwrap().content, "a".repeat(50));
    }

    #[tokio::test]
    async fn mid_stream_error_preserves_partial_reply() {
        let mut t = Transcript::new();
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"partial ans")),
            Err(ClientError::Other("connection reset".into())),
        ];

        let result = drain_into(&mut t, stream::iter(chunks), |_| {}).await;

        assert!(result.is_err());
        assert_eq!(t.len(), 1);
        assert_eq!(t.last().unwrap().content, "partial ans");
        // The partial turn is settled: a later stream opens a new one.
        t.apply_assistant_chunk("retry reply");
        assert_eq!(t.len(), 2);
    }

    #[tokio::test]
    async fn empty_stream_appends_nothing() {
        let mut t = Transcript::new();
        let reply = drain_into(&mut t, stream::iter(ok_chunks(&[])), |_| {})
            .await
            .unwrap();
        assert_eq!(reply, "");
        assert!(t.is_empty());
    }

    #[tokio::test]
    async fn deltas_concatenate_to_the_full_reply() {
        let mut t = Transcript::new();
        let chunks = ok_chunks(&["é".as_bytes(), b"t", b"oile"]);
        let mut seen = String::new();
        let reply = drain_into(&mut t, stream::iter(chunks), |piece| seen.push_str(piece))
            .await
            .unwrap();
        assert_eq!(seen, reply);
        assert_eq!(reply, "étoile");
    }

    #[test]
    fn decoder_buffers_split_multibyte_sequence() {
        let mut d = Utf8ChunkDecoder::new();
        let euro = "€".as_bytes(); // 3 bytes
        assert_eq!(d.decode(&euro[..1]), "");
        assert_eq!(d.decode(&euro[1..2]), "");
        assert_eq!(d.decode(&euro[2..]), "€");
        assert_eq!(d.finish(), "");
    }

    #[test]
    fn decoder_replaces_truncated_tail_on_finish() {
        let mut d = Utf8ChunkDecoder::new();
        let euro = "€".as_bytes();
        assert_eq!(d.decode(&euro[..2]), "");
        assert_eq!(d.finish(), "\u{FFFD}");
    }

    #[test]
    fn decoder_replaces_invalid_bytes_immediately() {
        let mut d = Utf8ChunkDecoder::new();
        let out = d.decode(&[b'o', b'k', 0xFF, b'!']);
        assert_eq!(out, "ok\u{FFFD}!");
    }
}
