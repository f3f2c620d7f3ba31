mod action;
mod backend;
mod conversation;
mod error;
mod event;
mod message;
mod page_context;
mod quote;
mod role;
mod slash_commands;
mod turn;

pub use action::*;
pub use backend::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use page_context::*;
pub use quote::*;
pub use role::*;
pub use slash_commands::*;
pub use turn::*;
