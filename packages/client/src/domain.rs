//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement client behavior
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/join <conversation>`
    Join(String),
    /// `/leave <conversation>`
    Leave(String),
    /// `/read <conversation>` marks everything unread as read
    Read(String),
    /// `/status <online|away|busy|do_not_disturb>`
    Status(String),
    /// `/typing <conversation>`
    TypingStart(String),
    /// `/done <conversation>`
    TypingStop(String),
    /// `/notifications` prints the current queue snapshot
    ShowNotifications,
    /// `/dismiss <id>`
    Dismiss(String),
    /// Plain text: send to the active conversation
    Say(String),
    /// Unknown slash command
    Unknown(String),
}

/// Parse one input line into a command.
///
/// Anything not starting with `/` is a message for the active
/// conversation.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Say(line.to_string());
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match (head, arg) {
        ("/join", arg) if !arg.is_empty() => Command::Join(arg.to_string()),
        ("/leave", arg) if !arg.is_empty() => Command::Leave(arg.to_string()),
        ("/read", arg) if !arg.is_empty() => Command::Read(arg.to_string()),
        ("/status", arg) if !arg.is_empty() => Command::Status(arg.to_string()),
        ("/typing", arg) if !arg.is_empty() => Command::TypingStart(arg.to_string()),
        ("/done", arg) if !arg.is_empty() => Command::TypingStop(arg.to_string()),
        ("/notifications", _) => Command::ShowNotifications,
        ("/dismiss", arg) if !arg.is_empty() => Command::Dismiss(arg.to_string()),
        _ => Command::Unknown(line.to_string()),
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::InvalidIdentity(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }
    current_attempt < max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_slash_commands() {
        // テスト項目: スラッシュコマンドが正しくパースされる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(parse_command("/join conv-1"), Command::Join("conv-1".to_string()));
        assert_eq!(parse_command("/leave conv-1"), Command::Leave("conv-1".to_string()));
        assert_eq!(parse_command("/read conv-1"), Command::Read("conv-1".to_string()));
        assert_eq!(parse_command("/status away"), Command::Status("away".to_string()));
        assert_eq!(parse_command("/typing conv-1"), Command::TypingStart("conv-1".to_string()));
        assert_eq!(parse_command("/done conv-1"), Command::TypingStop("conv-1".to_string()));
        assert_eq!(parse_command("/notifications"), Command::ShowNotifications);
        assert_eq!(parse_command("/dismiss m1"), Command::Dismiss("m1".to_string()));
    }

    #[test]
    fn test_parse_command_plain_text_is_say() {
        // テスト項目: スラッシュ無しの行はメッセージ送信になる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(parse_command("hello there"), Command::Say("hello there".to_string()));
        assert_eq!(parse_command("  spaced  "), Command::Say("spaced".to_string()));
    }

    #[test]
    fn test_parse_command_missing_argument_is_unknown() {
        // テスト項目: 引数必須コマンドの引数欠落は Unknown になる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(parse_command("/join"), Command::Unknown("/join".to_string()));
        assert_eq!(parse_command("/bogus x"), Command::Unknown("/bogus x".to_string()));
    }

    #[test]
    fn test_should_exit_immediately_with_invalid_identity() {
        // テスト項目: InvalidIdentity エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::InvalidIdentity("alice".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_on_connection_error() {
        // テスト項目: 接続エラーでは試行回数の範囲内で再接続される
        // given (前提条件):
        let error = ClientError::ConnectionError("reset".to_string());

        // when (操作) / then (期待する結果):
        assert!(should_attempt_reconnect(&error, 0, 5));
        assert!(should_attempt_reconnect(&error, 4, 5));
        assert!(!should_attempt_reconnect(&error, 5, 5));
    }

    #[test]
    fn test_should_not_reconnect_on_invalid_identity() {
        // テスト項目: InvalidIdentity では再接続しない
        // given (前提条件):
        let error = ClientError::InvalidIdentity("alice".to_string());

        // when (操作) / then (期待する結果):
        assert!(!should_attempt_reconnect(&error, 0, 5));
    }
}
