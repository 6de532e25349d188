pub mod traits;

// Data file sources
pub mod http;
#[cfg(not(target_arch = "wasm32"))]
pub mod local;
