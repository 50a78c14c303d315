mod chat;

pub use chat::ChatId;

/// Message ID type (WhatsApp internal ID string).
pub type MessageId = String;
