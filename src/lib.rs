pub mod config;
pub mod doc_processor;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod relay;
pub mod routes;
pub mod store;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::{router, AppState};
