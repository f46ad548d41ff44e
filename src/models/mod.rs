pub mod message;

pub use message::{Attachment, ChatMessage, MessageStatus, NewMessage, ParticipantRole};
