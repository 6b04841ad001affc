//! OJT Messaging Core Library
//!
//! This crate provides the direct-messaging core for the OJT monitoring
//! platform, including:
//! - Two-party conversations with storage-enforced pair uniqueness
//! - Append-only, totally ordered message streams per conversation
//! - Conversation summaries with last-message previews
//! - Storage (SQLite connection pool + versioned migrations)
//! - A `UserDirectory` port into the host's user store
//!
//! Identity, authorization context, and page rendering live in the host
//! application; every operation here takes the acting user explicitly.

pub mod directory;
pub mod error;
pub mod messaging;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::directory::{DirectoryEntry, InMemoryDirectory, UserDirectory};
    pub use crate::error::{Error, Result};
    pub use crate::messaging::{
        ConversationService, ConversationSummary, MessageView, Participant,
    };
    pub use crate::storage::{Database, DatabaseConfig};
}
