use chrono::{DateTime, NaiveDateTime};

use crate::api::models::Conversation;

const EMPTY_PREVIEW: &str = "Start the conversation";

/// `HH:MM` label for a message timestamp. The endpoint sends database
/// timestamps (`2024-05-01 18:30:00.123456`); RFC 3339 is accepted too.
/// Anything else is shown as-is.
pub fn message_time(created_at: &str) -> String {
    let raw = created_at.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%H:%M").to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format("%H:%M").to_string();
        }
    }
    raw.to_string()
}

pub fn avatar_initial(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

pub fn preview(conv: &Conversation) -> &str {
    match conv.last_message.as_deref() {
        Some(text) if !text.trim().is_empty() => text,
        _ => EMPTY_PREVIEW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_database_timestamps() {
        assert_eq!(message_time("2024-05-01 18:30:00.123456"), "18:30");
        assert_eq!(message_time("2024-05-01 07:05:59"), "07:05");
        assert_eq!(message_time("2024-05-01T09:15:00"), "09:15");
        assert_eq!(message_time("2024-05-01T09:15:00+03:00"), "09:15");
    }

    #[test]
    fn unparseable_time_is_passed_through() {
        assert_eq!(message_time("yesterday"), "yesterday");
        assert_eq!(message_time(""), "");
    }

    #[test]
    fn initials() {
        assert_eq!(avatar_initial("анна"), "А");
        assert_eq!(avatar_initial("  bob"), "B");
        assert_eq!(avatar_initial(""), "?");
    }

    #[test]
    fn preview_falls_back_when_empty() {
        let mut conv = Conversation {
            chat_id: 1,
            other_user_id: Some(2),
            other_user_name: Some("Anna".into()),
            other_user_image: None,
            last_message: None,
            last_message_time: None,
        };
        assert_eq!(preview(&conv), EMPTY_PREVIEW);
        conv.last_message = Some("See you".into());
        assert_eq!(preview(&conv), "See you");
    }
}
