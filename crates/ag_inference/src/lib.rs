pub mod classify;
pub mod json_reply;
pub mod models;
pub mod prompts;

pub use classify::{Classifier, EmailEnhancement};
pub use json_reply::extract_json;
pub use models::{create_model, ModelKind};

pub mod prelude {
    pub use super::classify::{Classifier, EmailEnhancement};
    pub use super::models::{azure::AzureOpenAiModel, create_model, scripted::ScriptedModel, ModelKind};
    pub use ag_core::{ChatMessage, Classification, LanguageModel, PageAnalysis, PageType, Result};
}
