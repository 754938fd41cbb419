pub mod agent;
pub mod api_client;
pub mod context;
pub mod dashboard;
pub mod rag;

pub use agent::{
    load_context_inputs, load_user_profile, ContextAgent, DeliverySummary, EmailAgent, TwitterAgent,
    WebsiteAgent,
};
pub use api_client::ApiClient;
pub use context::ClientContextFetcher;
pub use dashboard::DashboardSender;
pub use rag::RagClient;
