//! Timeline entries: messages grouped under day separators

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use super::Message;
use crate::format::{day_label, same_day};

/// One row of a rendered conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    /// Synthetic marker before the first message of a calendar day
    DateSeparator { label: String },
    /// A message annotated with local ownership
    Message { message: Message, is_mine: bool },
}

impl TimelineEntry {
    pub fn message(&self) -> Option<&Message> {
        match self {
            TimelineEntry::Message { message, .. } => Some(message),
            TimelineEntry::DateSeparator { .. } => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, TimelineEntry::DateSeparator { .. })
    }
}

/// Group time-ordered messages by local calendar day
///
/// `messages` must already be in timeline order. Every message is marked
/// as mine only when `current_user_id` is known and matches its sender.
/// Day boundaries and labels are computed in the time zone of `now`.
pub fn build_timeline<Tz>(
    messages: &[Message],
    current_user_id: Option<i64>,
    now: &DateTime<Tz>,
) -> Vec<TimelineEntry>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let mut entries = Vec::with_capacity(messages.len() + 1);
    let mut prev: Option<&Message> = None;

    for message in messages {
        let new_day = prev.map_or(true, |p| !same_day(&p.created_at, &message.created_at, &tz));
        if new_day {
            entries.push(TimelineEntry::DateSeparator {
                label: day_label(&message.created_at, now),
            });
        }
        prev = Some(message);

        entries.push(TimelineEntry::Message {
            is_mine: message.is_from(current_user_id),
            message: message.clone(),
        });
    }

    entries
}

/// Id of the newest message in a timeline
pub fn last_message_id(entries: &[TimelineEntry]) -> Option<i64> {
    entries.iter().rev().find_map(|e| e.message().map(|m| m.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReadState;
    use chrono::{Duration, FixedOffset, Utc};

    fn msg(id: i64, sender_id: i64, ts: DateTime<Utc>) -> Message {
        Message {
            id,
            sender_id,
            content: format!("message {id}"),
            created_at: ts,
            read_state: ReadState::Unknown,
            conversation_id: Some(1),
            rental_id: None,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn separators(entries: &[TimelineEntry]) -> Vec<&str> {
        entries
            .iter()
            .filter_map(|e| match e {
                TimelineEntry::DateSeparator { label } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty() {
        let now = at(2024, 1, 1, 12, 0);
        assert!(build_timeline(&[], Some(1), &now).is_empty());
    }

    #[test]
    fn test_same_day_single_separator() {
        let messages = vec![msg(1, 1, at(2024, 1, 1, 10, 0)), msg(2, 2, at(2024, 1, 1, 14, 30))];
        let now = at(2024, 1, 5, 9, 0);
        let entries = build_timeline(&messages, None, &now);

        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            TimelineEntry::DateSeparator {
                label: "Jan 1, 2024".to_string()
            }
        );
        assert_eq!(entries[1].message().map(|m| m.id), Some(1));
        assert_eq!(entries[2].message().map(|m| m.id), Some(2));
    }

    #[test]
    fn test_same_day_label_today() {
        let messages = vec![msg(1, 1, at(2024, 1, 1, 10, 0)), msg(2, 2, at(2024, 1, 1, 14, 30))];
        let now = at(2024, 1, 1, 20, 0);
        let entries = build_timeline(&messages, None, &now);
        assert_eq!(separators(&entries), vec!["Today"]);
    }

    #[test]
    fn test_two_days_two_separators() {
        let messages = vec![
            msg(1, 1, at(2024, 1, 1, 10, 0)),
            msg(2, 2, at(2024, 1, 1, 11, 0)),
            msg(3, 1, at(2024, 1, 2, 9, 0)),
        ];
        let now = at(2024, 1, 2, 12, 0);
        let entries = build_timeline(&messages, None, &now);

        assert_eq!(separators(&entries), vec!["Yesterday", "Today"]);
        assert!(entries[0].is_separator());
        assert!(entries[3].is_separator());
        assert_eq!(entries[4].message().map(|m| m.id), Some(3));
    }

    #[test]
    fn test_one_separator_per_distinct_day() {
        let start = at(2024, 3, 1, 6, 0);
        let messages: Vec<Message> = (0..40)
            .map(|i| msg(i, i % 2, start + Duration::hours(5 * i)))
            .collect();
        let now = at(2024, 6, 1, 0, 0);
        let entries = build_timeline(&messages, None, &now);

        let mut days: Vec<_> = messages.iter().map(|m| m.created_at.date_naive()).collect();
        days.dedup();
        assert_eq!(separators(&entries).len(), days.len());

        // every separator is followed by a message of a new day
        for (i, entry) in entries.iter().enumerate() {
            if entry.is_separator() {
                let next = entries[i + 1].message().unwrap();
                let prev = entries[..i].iter().rev().find_map(|e| e.message());
                if let Some(prev) = prev {
                    assert_ne!(prev.created_at.date_naive(), next.created_at.date_naive());
                }
            }
        }
        // no two separators in a row
        assert!(entries.windows(2).all(|w| !(w[0].is_separator() && w[1].is_separator())));
    }

    #[test]
    fn test_ownership() {
        let messages = vec![msg(1, 7, at(2024, 1, 1, 10, 0)), msg(2, 8, at(2024, 1, 1, 11, 0))];
        let now = at(2024, 1, 1, 12, 0);

        let mine: Vec<bool> = build_timeline(&messages, Some(7), &now)
            .iter()
            .filter_map(|e| match e {
                TimelineEntry::Message { is_mine, .. } => Some(*is_mine),
                _ => None,
            })
            .collect();
        assert_eq!(mine, vec![true, false]);

        let unknown = build_timeline(&messages, None, &now);
        assert!(unknown.iter().all(|e| !matches!(e, TimelineEntry::Message { is_mine: true, .. })));
    }

    #[test]
    fn test_last_message_id() {
        let messages = vec![msg(4, 1, at(2024, 1, 1, 10, 0)), msg(9, 1, at(2024, 1, 2, 10, 0))];
        let now = at(2024, 1, 2, 12, 0);
        let entries = build_timeline(&messages, None, &now);
        assert_eq!(last_message_id(&entries), Some(9));
        assert_eq!(last_message_id(&[]), None);
    }

    #[test]
    fn test_days_split_in_viewer_time_zone() {
        // 20:00 and 22:00 UTC on Jan 1 are Jan 2 01:30 and 03:30 in IST,
        // while 17:00 UTC is still Jan 1 there
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let messages = vec![
            msg(1, 1, at(2024, 1, 1, 17, 0)),
            msg(2, 2, at(2024, 1, 1, 20, 0)),
            msg(3, 1, at(2024, 1, 1, 22, 0)),
        ];
        let now = at(2024, 1, 2, 6, 0).with_timezone(&ist);
        let entries = build_timeline(&messages, None, &now);

        assert_eq!(separators(&entries), vec!["Yesterday", "Today"]);
        assert!(entries[2].is_separator());
        assert_eq!(entries[3].message().map(|m| m.id), Some(2));
    }
}
