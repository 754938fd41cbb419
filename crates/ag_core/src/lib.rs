pub mod classification;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod payload;
pub mod types;
pub mod validation;

pub use classification::{Classification, ItemAnalysis, PriorityLevel};
pub use config::{AppConfig, EndpointConfig, LlmConfig};
pub use context::{ContextProvider, NoContext};
pub use error::{Error, Result};
pub use models::{ChatMessage, LanguageModel};
pub use payload::{
    build_dashboard_payload, build_twitter_payload, Channel, DashboardPayload, SourceType,
    TwitterPayload,
};
pub use types::*;
