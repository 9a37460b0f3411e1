//! Conversation memory and session storage settings.
//!
//! The tables themselves are created and migrated by the agent runtime; this module only
//! decides which database and tables the runtime should use.

mod types;

pub use types::*;
