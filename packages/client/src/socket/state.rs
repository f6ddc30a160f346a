use std::fmt;

/// Lifecycle of one realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Waiting for the reconnect timer to fire
    Reconnecting,
    Error,
}

impl ConnectionState {
    /// Display label used at the presentation boundary
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_disconnected() {
        // テスト項目: 初期状態は Disconnected である
        // given (前提条件):
        // when (操作):
        let state = ConnectionState::default();

        // then (期待する結果):
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(!state.is_connected());
    }

    #[test]
    fn test_display_uses_label() {
        // テスト項目: Display 出力がラベルと一致する
        // given (前提条件):
        let state = ConnectionState::Reconnecting;

        // when (操作):
        let text = state.to_string();

        // then (期待する結果):
        assert_eq!(text, "reconnecting");
        assert_eq!(text, state.label());
    }
}
