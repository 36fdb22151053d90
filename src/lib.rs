pub mod config;
pub mod crew;
pub mod error;
pub mod http;
pub mod llm;
pub mod logging;
pub mod smoke;
pub mod switcher;
pub mod sync;
