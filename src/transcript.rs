// Parley — Transcript
// The ordered, append-only message log behind the chat view.
//
// Exactly one turn may be "in progress" at any time: the assistant turn
// currently being streamed, always at the tail. The in-progress state is an
// explicit flag, not inferred from the tail's role, so a finalized assistant
// turn is never accidentally overwritten by a later exchange.

use crate::atoms::types::ChatMessage;

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    /// True while the tail is the assistant turn of an active stream.
    streaming: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    /// Append a finalized turn. Any in-progress turn is settled first.
    pub fn append(&mut self, message: ChatMessage) {
        self.streaming = false;
        self.messages.push(message);
    }

    /// Apply the latest accumulated text of the active stream.
    ///
    /// If the tail is the in-progress assistant turn of this exchange its
    /// content is overwritten with `accumulated`; otherwise a new assistant
    /// turn is appended and marked in progress.
    pub fn apply_assistant_chunk(&mut self, accumulated: &str) {
        if self.streaming {
            if let Some(tail) = self.messages.last_mut() {
                tail.content.clear();
                tail.content.push_str(accumulated);
                return;
            }
        }
        self.messages.push(ChatMessage::assistant_text(accumulated));
        self.streaming = true;
    }

    /// Settle the in-progress turn. Called at stream end, and on stream
    /// error so the partial content stays visible as-is.
    pub fn finalize_stream(&mut self) {
        self.streaming = false;
    }

    /// Replace the whole log with prior finalized turns (history load).
    pub fn load(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        self.streaming = false;
    }

    /// Read-only ordered view. Insertion order is the only guarantee.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::Role;

    #[test]
    fn chunks_mutate_a_single_assistant_turn() {
        let mut t = Transcript::new();
        t.append(ChatMessage::user_text("hi"));

        t.apply_assistant_chunk("Hel");
        t.apply_assistant_chunk("Hello, ");
        t.apply_assistant_chunk("Hello, world");
        t.finalize_stream();

        assert_eq!(t.len(), 2);
        let tail = t.last().unwrap();
        assert_eq!(tail.role, Role::Assistant);
        assert_eq!(tail.content, "Hello, world");
    }

    #[test]
    fn finalized_assistant_tail_is_not_overwritten() {
        let mut t = Transcript::new();
        t.apply_assistant_chunk("first reply");
        t.finalize_stream();

        // A new stream must open a fresh turn even though the tail is
        // assistant-authored.
        t.apply_assistant_chunk("second reply");
        t.finalize_stream();

        assert_eq!(t.len(), 2);
        assert_eq!(t.messages()[0].content, "first reply");
        assert_eq!(t.messages()[1].content, "second reply");
    }

    #[test]
    fn append_settles_an_active_stream() {
        let mut t = Transcript::new();
        t.apply_assistant_chunk("partial");
        t.append(ChatMessage::user_text("next question"));
        t.apply_assistant_chunk("new stream");

        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[0].content, "partial");
        assert_eq!(t.messages()[2].content, "new stream");
    }

    #[test]
    fn load_replaces_contents_and_clears_streaming() {
        let mut t = Transcript::new();
        t.apply_assistant_chunk("in flight");
        t.load(vec![ChatMessage::user_text("old"), ChatMessage::assistant_text("older reply")]);

        assert_eq!(t.len(), 2);
        // The restored tail is finalized: a new stream appends.
        t.apply_assistant_chunk("fresh");
        assert_eq!(t.len(), 3);
    }
}
