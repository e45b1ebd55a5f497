pub mod memory;
pub mod trader_agent;

pub use memory::{ConversationMemory, Role, Turn};
pub use trader_agent::{ChatReply, TraderAgent};
