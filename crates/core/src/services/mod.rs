pub mod chat_service;
pub mod collation;
pub mod loader_service;
pub mod picks_service;
pub mod scanner_service;
pub mod suggestion_service;
pub mod table_service;
