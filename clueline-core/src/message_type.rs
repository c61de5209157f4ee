//! Message type tags used by the game server
//!
//! Type tags are plain strings on the wire. These constants name the ones
//! the game protocol defines, so application code can write
//! `Topic::kind(message_type::CHAT_MESSAGE)` instead of repeating literals.

// Connection
pub const CONNECT: &str = "connect";
pub const DISCONNECT: &str = "disconnect";

// Game
pub const GAME_JOIN: &str = "game_join";
pub const GAME_LEAVE: &str = "game_leave";
pub const GAME_START: &str = "game_start";
pub const GAME_END: &str = "game_end";
pub const GAME_UPDATE: &str = "game_update";

// Players
pub const PLAYER_JOIN: &str = "player_join";
pub const PLAYER_LEAVE: &str = "player_leave";
pub const PLAYER_READY: &str = "player_ready";
pub const PLAYER_ACTION: &str = "player_action";

// Clue search
pub const CLUE_SEARCH: &str = "clue_search";
pub const CLUE_FOUND: &str = "clue_found";
pub const CLUE_SHARE: &str = "clue_share";

// Chat
pub const CHAT_MESSAGE: &str = "chat_message";
pub const SYSTEM_MESSAGE: &str = "system_message";

// Phases
pub const PHASE_CHANGE: &str = "phase_change";
pub const TURN_CHANGE: &str = "turn_change";

// Voting
pub const VOTE_START: &str = "vote_start";
pub const VOTE_CAST: &str = "vote_cast";
pub const VOTE_END: &str = "vote_end";

/// Server-reported application error (not the link's own error event)
pub const ERROR: &str = "error";

/// Inbound frames that were not structured `{type, data}` JSON
pub const RAW: &str = "raw";

/// Reserved tag of [`Topic::Connected`](crate::Topic::Connected)
pub const CONNECTED: &str = "__connected__";
/// Reserved tag of [`Topic::Disconnected`](crate::Topic::Disconnected)
pub const DISCONNECTED: &str = "__disconnected__";
/// Reserved tag of [`Topic::Error`](crate::Topic::Error)
pub const ERROR_EVENT: &str = "__error__";
/// Reserved tag of [`Topic::AnyMessage`](crate::Topic::AnyMessage)
pub const ANY_MESSAGE: &str = "__message__";

/// All game protocol message types, in protocol order
pub const ALL: &[&str] = &[
    CONNECT,
    DISCONNECT,
    GAME_JOIN,
    GAME_LEAVE,
    GAME_START,
    GAME_END,
    GAME_UPDATE,
    PLAYER_JOIN,
    PLAYER_LEAVE,
    PLAYER_READY,
    PLAYER_ACTION,
    CLUE_SEARCH,
    CLUE_FOUND,
    CLUE_SHARE,
    CHAT_MESSAGE,
    SYSTEM_MESSAGE,
    PHASE_CHANGE,
    TURN_CHANGE,
    VOTE_START,
    VOTE_CAST,
    VOTE_END,
    ERROR,
];

/// Whether `tag` is one of the reserved lifecycle tags
pub fn is_reserved(tag: &str) -> bool {
    matches!(tag, CONNECTED | DISCONNECTED | ERROR_EVENT | ANY_MESSAGE)
}
