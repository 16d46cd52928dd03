pub mod catalog;
pub mod chat_service;
pub mod conversation_service;
pub mod identity;
pub mod message_service;
