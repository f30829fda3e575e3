//! Query Layer - validation, chat enumeration and message retrieval

pub mod validator;
pub mod chats;
pub mod messages;
pub mod runner;

pub use validator::validate;
pub use chats::list_chats;
pub use messages::{Retrieval, retrieve_messages};
pub use runner::{MessageQuery, QueryState, RetrievalOutcome};
