pub mod machine;
pub mod presentation;
pub mod service;
pub mod state;
pub mod store;

pub use presentation::{Menu, RenderedMessage};
pub use service::ConversationService;
pub use state::UserId;
pub use store::InMemoryStore;
