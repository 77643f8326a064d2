//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod sidebar;

pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::{Composer, ComposerResult, ComposerView};
pub use history::{HistoryState, HistoryView};
pub use manager::{ConversationAction, ConversationManager};
pub use sidebar::SidebarView;
