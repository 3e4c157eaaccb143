//! Event formatting utilities for client display.

use chrono::{Local, TimeZone};

use kakehashi_server::infrastructure::dto::websocket::{MessageDto, PresenceInfoDto};

use crate::notify::QueueEntry;
use crate::notify::normalize::CanonicalEvent;

/// Event formatter for client display
pub struct EventFormatter;

impl EventFormatter {
    /// Format the connection ack showing the current presence roster
    pub fn format_connected(roster: &[PresenceInfoDto], current_user_id: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Online now:\n");

        if roster.is_empty() {
            output.push_str("(Nobody online)\n");
        } else {
            for entry in roster {
                let is_me = entry.user_id == current_user_id;
                let me_suffix = if is_me { " (me)" } else { "" };
                output.push_str(&format!(
                    "{}{} - {} since {}\n",
                    entry.user_id,
                    me_suffix,
                    entry.status.as_str(),
                    local_time(entry.changed_at)
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a fanned-out conversation message
    pub fn format_new_message(conversation_id: &str, message: &MessageDto) -> String {
        format!(
            "\n[{}] {} ({}): {}\n",
            conversation_id,
            message.sender_name,
            local_time(message.created_at),
            message.content
        )
    }

    pub fn format_user_typing(conversation_id: &str, user_id: &str, is_typing: bool) -> String {
        if is_typing {
            format!("\n[{conversation_id}] {user_id} is typing…\n")
        } else {
            format!("\n[{conversation_id}] {user_id} stopped typing\n")
        }
    }

    pub fn format_messages_read(conversation_id: &str, user_id: &str) -> String {
        format!("\n[{conversation_id}] {user_id} read the messages\n")
    }

    pub fn format_user_online(user_id: &str, timestamp: i64) -> String {
        format!("\n+ {} is online ({})\n", user_id, local_time(timestamp))
    }

    pub fn format_user_offline(user_id: &str, timestamp: i64) -> String {
        format!("\n- {} went offline ({})\n", user_id, local_time(timestamp))
    }

    pub fn format_presence_updated(user_id: &str, status: &str) -> String {
        format!("\n* {user_id} is now {status}\n")
    }

    pub fn format_error(code: &str, detail: &str) -> String {
        format!("\n! {code}: {detail}\n")
    }

    /// Format the notification queue snapshot
    pub fn format_notifications(entries: &[QueueEntry]) -> String {
        if entries.is_empty() {
            return "\n(No notifications)\n".to_string();
        }
        let mut output = String::new();
        output.push_str("\nNotifications:\n");
        for entry in entries {
            output.push_str(&format!("  {}\n", Self::format_queue_entry(entry)));
        }
        output
    }

    fn format_queue_entry(entry: &QueueEntry) -> String {
        match &entry.event {
            CanonicalEvent::MessageNotification {
                id,
                conversation_id,
                sender_id,
                sender_name,
                preview,
                ..
            } => {
                let sender = sender_name.as_deref().unwrap_or(sender_id);
                let preview = preview.as_deref().unwrap_or("(no preview)");
                format!("[{id}] {sender} in {conversation_id}: {preview}")
            }
            CanonicalEvent::GeneralNotification { id, title, content, .. } => match content {
                Some(content) => format!("[{id}] {title} - {content}"),
                None => format!("[{id}] {title}"),
            },
            CanonicalEvent::SseMessage { id, event, .. } => {
                format!("[{id}] stream event '{event}'")
            }
        }
    }

    /// Fallback for frames the client does not recognize
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{text}\n")
    }
}

fn local_time(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let nanos = ((timestamp_millis % 1000) * 1_000_000) as u32;
    match Local.timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => format!("@{timestamp_millis}"),
    }
}
