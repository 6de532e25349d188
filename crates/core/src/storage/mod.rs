pub mod feed;
pub mod manager;
pub mod memory;
pub mod traits;
