pub mod message_dto;
pub mod message_handlers;
pub mod message_memory_repository;
pub mod message_models;
pub mod message_repository;
pub mod message_service;

pub use message_dto::{MessageCreatedResponse, SendMessageRequest};
pub use message_memory_repository::InMemoryMessageRepository;
pub use message_models::{Message, MessageInput, MessageResponse, NewMessage, Recipient};
pub use message_repository::{MessageRepository, PgMessageRepository, RepositoryError};
pub use message_service::MessageService;
