//! Plain-text rendering of chat views

use std::collections::HashSet;
use std::io::{self, Write};

use chrono::Local;
use stayspot_core::format::time_label;
use stayspot_core::{ListingSummary, Message, ReadState, TimelineEntry};

use crate::viewmodel::{ChatView, ConversationRow};

/// Header printed once above a chat
pub fn listing_header(listing: &ListingSummary) -> String {
    let mut details = Vec::new();
    if let Some(location) = listing.location.as_deref().filter(|l| !l.is_empty()) {
        details.push(location.to_string());
    }
    if let Some(price) = listing.price_label() {
        details.push(price);
    }

    if details.is_empty() {
        format!("== {} ==", listing.title)
    } else {
        format!("== {} ==\n   {}", listing.title, details.join(" | "))
    }
}

pub fn message_line(message: &Message, is_mine: bool) -> String {
    let time = time_label(&message.created_at.with_timezone(&Local));
    if is_mine {
        let marker = match message.read_state {
            ReadState::Read => " (read)",
            _ => "",
        };
        format!("{time} you: {}{marker}", message.content)
    } else {
        format!("{time} them: {}", message.content)
    }
}

pub fn conversation_line(row: &ConversationRow) -> String {
    let mut line = format!("#{} {}", row.id, row.title);
    if !row.location.is_empty() {
        line.push_str(&format!(" ({})", row.location));
    }
    if !row.counterpart.is_empty() {
        line.push_str(&format!(" with {}", row.counterpart));
    }
    line.push_str(&format!("\n    {}", row.preview));
    if !row.time.is_empty() {
        line.push_str(&format!("  [{}]", row.time));
    }
    line
}

/// Appends a chat transcript to a terminal
///
/// Messages are printed once, on the scroll pulse that brought them in.
/// Errors are reported when they first appear.
pub struct TranscriptPrinter<W: Write> {
    out: W,
    printed: HashSet<i64>,
    last_separator: Option<String>,
    seen_pulses: u64,
    last_error: Option<String>,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: HashSet::new(),
            last_separator: None,
            seen_pulses: 0,
            last_error: None,
        }
    }

    pub fn render(&mut self, view: &ChatView) -> io::Result<()> {
        if view.error != self.last_error {
            if let Some(error) = &view.error {
                writeln!(self.out, "! {error}")?;
            }
            self.last_error = view.error.clone();
        }

        if view.scroll_pulses == self.seen_pulses {
            return Ok(());
        }
        self.seen_pulses = view.scroll_pulses;

        let mut pending_separator: Option<&str> = None;
        for entry in &view.entries {
            match entry {
                TimelineEntry::DateSeparator { label } => pending_separator = Some(label.as_str()),
                TimelineEntry::Message { message, is_mine } => {
                    if !self.printed.insert(message.id) {
                        continue;
                    }
                    if let Some(label) = pending_separator.take() {
                        if self.last_separator.as_deref() != Some(label) {
                            writeln!(self.out, "--- {label} ---")?;
                            self.last_separator = Some(label.to_string());
                        }
                    }
                    writeln!(self.out, "{}", message_line(message, *is_mine))?;
                }
            }
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
