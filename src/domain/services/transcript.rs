#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;

use crate::domain::models::PageContext;
use crate::domain::models::Role;

/// Where a session projects what the user sees. Display only: nothing
/// rendered here is read back into the conversation.
pub trait RenderSink {
    fn page_context(&mut self, page: &PageContext);

    /// The pending quote banner, `None` hides it.
    fn quote(&mut self, quote: Option<&str>);

    /// A complete entry.
    fn message(&mut self, role: Role, text: &str);

    /// Appends to the in-progress assistant entry, opening one if needed.
    fn token(&mut self, token: &str);

    /// A short status line that is not part of the transcript.
    fn notice(&mut self, text: &str);

    /// Freezes the in-progress assistant entry, leaving it visible.
    fn finish_stream(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub streaming: bool,
}

/// In-memory transcript, the visible side of a session.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    pub page: Option<PageContext>,
    pub quote: Option<String>,
    pub entries: Vec<TranscriptEntry>,
    pub notices: Vec<String>,
}

impl Transcript {
    pub fn texts(&self) -> Vec<&str> {
        return self
            .entries
            .iter()
            .map(|entry| return entry.text.as_str())
            .collect();
    }

    pub fn is_streaming(&self) -> bool {
        return self
            .entries
            .last()
            .map(|entry| return entry.streaming)
            .unwrap_or(false);
    }
}

impl RenderSink for Transcript {
    fn page_context(&mut self, page: &PageContext) {
        self.page = Some(page.clone());
    }

    fn quote(&mut self, quote: Option<&str>) {
        self.quote = quote.map(|text| return text.to_string());
    }

    fn message(&mut self, role: Role, text: &str) {
        self.finish_stream();
        self.entries.push(TranscriptEntry {
            role,
            text: text.to_string(),
            streaming: false,
        });
    }

    fn token(&mut self, token: &str) {
        if !self.is_streaming() {
            self.entries.push(TranscriptEntry {
                role: Role::Assistant,
                text: "".to_string(),
                streaming: true,
            });
        }

        if let Some(entry) = self.entries.last_mut() {
            entry.text += token;
        }
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn finish_stream(&mut self) {
        if let Some(entry) = self.entries.last_mut() {
            entry.streaming = false;
        }
    }
}
