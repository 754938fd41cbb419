use ag_core::{Error, LanguageModel, LlmConfig, Result};
use std::sync::Arc;

pub mod azure;
pub mod scripted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ModelKind {
    /// Azure OpenAI chat deployment
    #[default]
    Azure,
    /// Offline model answering every prompt with `{}`
    Offline,
}

/// Builds the model selected on the command line.
pub fn create_model(kind: ModelKind, config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    match kind {
        ModelKind::Azure => {
            if !config.is_configured() {
                return Err(Error::Config(
                    "AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY are required".to_string(),
                ));
            }
            Ok(Arc::new(azure::AzureOpenAiModel::new(config.clone())?))
        }
        ModelKind::Offline => Ok(Arc::new(scripted::ScriptedModel::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_requires_credentials() {
        let err = create_model(ModelKind::Azure, &LlmConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_offline_model() {
        let model = create_model(ModelKind::Offline, &LlmConfig::default()).unwrap();
        assert_eq!(model.name(), "scripted");
    }
}
