pub mod chat;
pub mod directory;
pub mod pick;
pub mod session;
pub mod settings;
pub mod stock;
pub mod suggestion;
pub mod table;
