//! Normalization of heterogeneous raw notification payloads.
//!
//! Pure function set, no stored state. Raw inputs arrive from the live
//! socket, from server-push streams and from persisted notification
//! records; all of them are validated into the small canonical union
//! below or dropped.
//!
//! Drop policy is fail-soft: a malformed element never aborts the rest
//! of a batch. Callers iterate, collect successes, and the drops are
//! observable only through the warning log.

use serde_json::{Map, Value};
use thiserror::Error;

use kakehashi_shared::time::Clock;

/// Canonical notification event union.
///
/// Every variant carries a non-empty id and a timestamp, defaulted at
/// construction time when the raw input lacks them.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalEvent {
    /// Raw server-push stream message, kept as tagged data
    SseMessage {
        id: String,
        timestamp: i64,
        event: String,
        data: Value,
    },
    /// A message someone else sent in a conversation
    MessageNotification {
        id: String,
        timestamp: i64,
        conversation_id: String,
        sender_id: String,
        sender_name: Option<String>,
        preview: Option<String>,
    },
    /// Anything announced through the general notification channel
    GeneralNotification {
        id: String,
        timestamp: i64,
        title: String,
        content: Option<String>,
        data: Map<String, Value>,
    },
}

impl CanonicalEvent {
    pub fn id(&self) -> &str {
        match self {
            CanonicalEvent::SseMessage { id, .. }
            | CanonicalEvent::MessageNotification { id, .. }
            | CanonicalEvent::GeneralNotification { id, .. } => id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            CanonicalEvent::SseMessage { timestamp, .. }
            | CanonicalEvent::MessageNotification { timestamp, .. }
            | CanonicalEvent::GeneralNotification { timestamp, .. } => *timestamp,
        }
    }

    /// Conversation this event belongs to, for message-class events
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            CanonicalEvent::MessageNotification {
                conversation_id, ..
            } => Some(conversation_id),
            _ => None,
        }
    }
}

/// Why a raw payload produced no canonical event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unsupported event type '{0}'")]
    UnsupportedType(String),
}

/// Normalize one raw payload.
///
/// `Ok(None)` is intentional suppression (a `new_message` authored by
/// the viewing identity itself), distinct from a drop: nothing is
/// logged for it beyond debug level.
pub fn normalize(
    raw: &Value,
    viewer_id: &str,
    clock: &dyn Clock,
) -> Result<Option<CanonicalEvent>, DropReason> {
    let obj = raw.as_object().ok_or(DropReason::NotAnObject)?;
    let event_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DropReason::MissingField("type"))?;

    match event_type {
        "new_message" => normalize_new_message(obj, viewer_id, clock),
        "notification" => normalize_general(obj, clock).map(Some),
        "sse_message" => normalize_sse(obj, clock).map(Some),
        other => Err(DropReason::UnsupportedType(other.to_string())),
    }
}

/// Normalize a batch, collecting successes and logging drops.
pub fn normalize_batch(raws: &[Value], viewer_id: &str, clock: &dyn Clock) -> Vec<CanonicalEvent> {
    let mut events = Vec::new();
    for raw in raws {
        match normalize(raw, viewer_id, clock) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {
                tracing::debug!("Suppressed self-authored event");
            }
            Err(reason) => {
                tracing::warn!("Dropping raw notification payload: {}", reason);
            }
        }
    }
    events
}

fn normalize_new_message(
    obj: &Map<String, Value>,
    viewer_id: &str,
    clock: &dyn Clock,
) -> Result<Option<CanonicalEvent>, DropReason> {
    let conversation_id = non_empty_str(obj.get("conversation_id"))
        .ok_or(DropReason::MissingField("conversation_id"))?;
    let message = obj
        .get("message")
        .and_then(Value::as_object)
        .ok_or(DropReason::MissingField("message"))?;
    let sender_id = non_empty_str(message.get("sender_id"))
        .ok_or(DropReason::MissingField("message.sender_id"))?;

    // Self-echo suppression: the viewer is never notified about their
    // own message.
    if sender_id == viewer_id {
        return Ok(None);
    }

    let timestamp = message
        .get("created_at")
        .and_then(Value::as_i64)
        .or_else(|| obj.get("timestamp").and_then(Value::as_i64))
        .unwrap_or_else(|| clock.now_millis());

    Ok(Some(CanonicalEvent::MessageNotification {
        id: id_or_placeholder(message.get("id")),
        timestamp,
        conversation_id: conversation_id.to_string(),
        sender_id: sender_id.to_string(),
        sender_name: non_empty_str(message.get("sender_name")).map(str::to_string),
        preview: non_empty_str(message.get("content")).map(str::to_string),
    }))
}

fn normalize_general(
    obj: &Map<String, Value>,
    clock: &dyn Clock,
) -> Result<CanonicalEvent, DropReason> {
    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    // Title comes from the top level when present, otherwise from the
    // payload's data map.
    let title = non_empty_str(obj.get("title"))
        .or_else(|| non_empty_str(data.get("title")))
        .ok_or(DropReason::MissingField("title"))?
        .to_string();

    let content = non_empty_str(obj.get("content"))
        .or_else(|| non_empty_str(obj.get("body")))
        .map(str::to_string);

    Ok(CanonicalEvent::GeneralNotification {
        id: id_or_placeholder(obj.get("id")),
        timestamp: obj
            .get("timestamp")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| clock.now_millis()),
        title,
        content,
        data,
    })
}

fn normalize_sse(
    obj: &Map<String, Value>,
    clock: &dyn Clock,
) -> Result<CanonicalEvent, DropReason> {
    let event =
        non_empty_str(obj.get("event")).ok_or(DropReason::MissingField("event"))?;

    Ok(CanonicalEvent::SseMessage {
        id: id_or_placeholder(obj.get("id")),
        timestamp: obj
            .get("timestamp")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| clock.now_millis()),
        event: event.to_string(),
        data: obj.get("data").cloned().unwrap_or(Value::Null),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn id_or_placeholder(value: Option<&Value>) -> String {
    match non_empty_str(value) {
        Some(id) => id.to_string(),
        None => format!("generated-{}", uuid::Uuid::new_v4()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakehashi_shared::time::FixedClock;
    use serde_json::json;

    const NOW: i64 = 1700000000000;

    fn clock() -> FixedClock {
        FixedClock::new(NOW)
    }

    fn message_event(sender: &str) -> Value {
        json!({
            "type": "new_message",
            "conversation_id": "conv-1",
            "message": {
                "id": "m1",
                "sender_id": sender,
                "sender_name": "Sender",
                "content": "hello",
                "created_at": 1690000000000i64,
            }
        })
    }

    #[test]
    fn test_new_message_from_other_user_becomes_message_notification() {
        // テスト項目: 他人の new_message が MessageNotification に変換される
        // given (前提条件):
        let raw = message_event("bob");

        // when (操作):
        let result = normalize(&raw, "alice", &clock()).unwrap();

        // then (期待する結果):
        let event = result.unwrap();
        assert_eq!(
            event,
            CanonicalEvent::MessageNotification {
                id: "m1".to_string(),
                timestamp: 1690000000000,
                conversation_id: "conv-1".to_string(),
                sender_id: "bob".to_string(),
                sender_name: Some("Sender".to_string()),
                preview: Some("hello".to_string()),
            }
        );
    }

    #[test]
    fn test_self_echo_is_suppressed() {
        // テスト項目: 自分が送信した new_message はイベントを生まない
        // given (前提条件):
        let raw = message_event("alice");

        // when (操作):
        let result = normalize(&raw, "alice", &clock());

        // then (期待する結果): エラーではなく「イベントなし」
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_missing_conversation_id_is_dropped() {
        // テスト項目: conversation_id 欠落の new_message は drop される
        // given (前提条件):
        let raw = json!({
            "type": "new_message",
            "message": {"id": "m1", "sender_id": "bob"}
        });

        // when (操作):
        let result = normalize(&raw, "alice", &clock());

        // then (期待する結果):
        assert_eq!(result, Err(DropReason::MissingField("conversation_id")));
    }

    #[test]
    fn test_missing_id_and_timestamp_are_defaulted() {
        // テスト項目: id とタイムスタンプ欠落時は構築時に補完される
        // given (前提条件):
        let raw = json!({
            "type": "new_message",
            "conversation_id": "conv-1",
            "message": {"sender_id": "bob"}
        });

        // when (操作):
        let event = normalize(&raw, "alice", &clock()).unwrap().unwrap();

        // then (期待する結果): 空でない id と現在時刻が入る
        assert!(!event.id().is_empty());
        assert!(event.id().starts_with("generated-"));
        assert_eq!(event.timestamp(), NOW);
    }

    #[test]
    fn test_notification_pulls_title_from_data_map() {
        // テスト項目: トップレベル title 欠落時は data.title が使われる
        // given (前提条件):
        let raw = json!({
            "type": "notification",
            "id": "n1",
            "data": {"title": "Maintenance window", "level": "info"}
        });

        // when (操作):
        let event = normalize(&raw, "alice", &clock()).unwrap().unwrap();

        // then (期待する結果):
        match event {
            CanonicalEvent::GeneralNotification { title, data, .. } => {
                assert_eq!(title, "Maintenance window");
                assert_eq!(data.get("level"), Some(&json!("info")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_notification_without_any_title_is_dropped() {
        // テスト項目: title がどこにも無い notification は drop される
        // given (前提条件):
        let raw = json!({"type": "notification", "id": "n1", "data": {}});

        // when (操作):
        let result = normalize(&raw, "alice", &clock());

        // then (期待する結果):
        assert_eq!(result, Err(DropReason::MissingField("title")));
    }

    #[test]
    fn test_sse_message_requires_event_field() {
        // テスト項目: sse_message は event フィールドが必須
        // given (前提条件):
        let with_event = json!({"type": "sse_message", "event": "heartbeat", "data": {"seq": 1}});
        let without_event = json!({"type": "sse_message", "data": {}});

        // when (操作) / then (期待する結果):
        let event = normalize(&with_event, "alice", &clock()).unwrap().unwrap();
        assert!(matches!(event, CanonicalEvent::SseMessage { ref event, .. } if event == "heartbeat"));
        assert_eq!(
            normalize(&without_event, "alice", &clock()),
            Err(DropReason::MissingField("event"))
        );
    }

    #[test]
    fn test_unsupported_type_is_dropped() {
        // テスト項目: 未知の type は UnsupportedType で drop される
        // given (前提条件):
        let raw = json!({"type": "user_typing", "conversation_id": "conv-1"});

        // when (操作):
        let result = normalize(&raw, "alice", &clock());

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DropReason::UnsupportedType("user_typing".to_string()))
        );
    }

    #[test]
    fn test_batch_is_fail_soft() {
        // テスト項目: 5 件中 2 件不正のバッチから 3 件の正規化イベントが得られる
        // given (前提条件):
        let batch = vec![
            message_event("bob"),
            json!({"type": "notification"}),              // title なし → drop
            json!({"type": "notification", "title": "t", "id": "n1"}),
            json!("not an object"),                       // object ですらない → drop
            json!({"type": "sse_message", "event": "ping"}),
        ];

        // when (操作):
        let events = normalize_batch(&batch, "alice", &clock());

        // then (期待する結果): 途中で中断せず 3 件が生き残る
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_batch_suppression_is_not_counted_as_drop() {
        // テスト項目: 自分のメッセージはバッチ結果に含まれないがエラーでもない
        // given (前提条件):
        let batch = vec![message_event("alice"), message_event("bob")];

        // when (操作):
        let events = normalize_batch(&batch, "alice", &clock());

        // then (期待する結果):
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id(), "m1");
    }
}
