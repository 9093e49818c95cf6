//! Stage collaborators and per-session options.

use std::path::PathBuf;
use std::sync::Arc;

use parla_core::{ParlaConfig, Result};
use parla_retrieval::{KeywordRetriever, Retriever};
use parla_speech::{
    synthesizer_from_config, transcriber_from_config, MockSynthesizer, MockTranscriber,
    Synthesizer, Transcriber,
};

use crate::generator::{generator_from_config, Generator, MockGenerator};

/// The four stage backends shared by every session.
#[derive(Clone)]
pub struct PipelineServices {
    pub transcriber: Arc<dyn Transcriber>,
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn Generator>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl PipelineServices {
    /// Build the backends selected by configuration.
    pub fn from_config(config: &ParlaConfig) -> Result<Self> {
        Ok(Self {
            transcriber: transcriber_from_config(&config.transcription)?,
            retriever: Arc::new(KeywordRetriever::from_config(&config.retrieval)?),
            generator: generator_from_config(&config.generation)?,
            synthesizer: synthesizer_from_config(&config.synthesis)?,
        })
    }

    /// Offline backends with the built-in knowledge base.
    pub fn mock() -> Self {
        Self {
            transcriber: Arc::new(MockTranscriber::new()),
            retriever: Arc::new(KeywordRetriever::default()),
            generator: Arc::new(MockGenerator::new()),
            synthesizer: Arc::new(MockSynthesizer::new()),
        }
    }

    /// Backend labels keyed by stage.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("transcription", self.transcriber.name()),
            ("retrieval", "keyword".to_string()),
            ("generation", self.generator.name()),
            ("synthesis", self.synthesizer.name()),
        ]
    }
}

/// Knobs an orchestrator reads on every run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Conversation window handed to the generator.
    pub window: usize,
    pub retrieval_enabled: bool,
    pub augment_top_k: usize,
    pub healthcare_top_k: usize,
    /// Directory synthesized replies are written to.
    pub output_dir: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&ParlaConfig::default())
    }
}

impl PipelineOptions {
    pub fn from_config(config: &ParlaConfig) -> Self {
        Self {
            window: config.conversation.window,
            retrieval_enabled: config.retrieval.enabled,
            augment_top_k: config.retrieval.augment_top_k,
            healthcare_top_k: config.retrieval.healthcare_top_k,
            output_dir: config.general.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parla_core::config::ProviderKind;

    #[test]
    fn test_options_from_config() {
        let mut config = ParlaConfig::default();
        config.conversation.window = 4;
        config.retrieval.enabled = false;
        config.general.output_dir = PathBuf::from("/tmp/replies");
        let options = PipelineOptions::from_config(&config);
        assert_eq!(options.window, 4);
        assert!(!options.retrieval_enabled);
        assert_eq!(options.augment_top_k, 3);
        assert_eq!(options.healthcare_top_k, 2);
        assert_eq!(options.output_dir, PathBuf::from("/tmp/replies"));
    }

    #[test]
    fn test_services_from_mock_config() {
        let mut config = ParlaConfig::default();
        config.transcription.provider = ProviderKind::Mock;
        config.generation.provider = ProviderKind::Mock;
        config.synthesis.provider = ProviderKind::Mock;
        let services = PipelineServices::from_config(&config).unwrap();
        let labels = services.describe();
        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|(_, name)| name == "mock" || name == "keyword"));
    }

    #[test]
    fn test_services_from_config_propagates_missing_key() {
        let mut config = ParlaConfig::default();
        config.transcription.provider = ProviderKind::Mock;
        config.synthesis.provider = ProviderKind::Mock;
        config.generation.api_key_env = Some("PARLA_TEST_MISSING_KEY".to_string());
        assert!(PipelineServices::from_config(&config).is_err());
    }
}
