// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt;
use serde::{Deserialize, Serialize};

/// Lifecycle of a live feed session.
///
/// ```text
/// Connecting --> Subscribed --> Stopped
///     |              |
///     v              v
///  Disconnected <----+
///     |
///     +--> Connecting (reconnect attempt)
/// ```
///
/// Every non-terminal state may move to `Stopped`; `Stopped` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    Subscribed,
    Disconnected,
    Stopped,
}

impl SessionState {
    /// Check if transition from current state to target state is valid
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use SessionState::{Connecting, Disconnected, Stopped, Subscribed};

        matches!(
            (self, target),
            (Connecting, Subscribed)
                | (Connecting, Disconnected)
                | (Subscribed, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting | Subscribed | Disconnected, Stopped)
        )
    }

    /// `true` once the session has been stopped.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// `true` while messages can be ingested.
    #[must_use]
    pub const fn accepts_messages(self) -> bool {
        matches!(self, Self::Subscribed)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Subscribed => "Subscribed",
            Self::Disconnected => "Disconnected",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
