//! Workflow state threaded through the pipeline stages.
//!
//! One `TranslationState` is created per run and owned by that run; stages
//! return partial `StateUpdate`s that the runner merges into it.

/// Accumulated state of a single translate-and-speak run.
#[derive(Debug, Clone, Default)]
pub struct TranslationState {
    /// Input text, immutable after creation
    pub original_text: String,
    /// Target language display name, immutable after creation
    pub target_language: String,
    /// Verdict of the safety stage; once set it is never cleared
    pub is_safe: Option<bool>,
    /// Cumulative translation; replaced by longer prefixes while streaming
    pub translated_text: Option<String>,
    /// Synthesized audio, set at most once on successful synthesis
    pub audio_bytes: Option<Vec<u8>>,
    /// A non-empty value terminates the pipeline at the next gate
    pub error_message: Option<String>,
}

impl TranslationState {
    pub fn new(original_text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            target_language: target_language.into(),
            ..Default::default()
        }
    }

    /// Merge a partial stage output into the accumulated state. A `Some`
    /// field overwrites the accumulated value, `None` leaves it untouched.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(is_safe) = update.is_safe {
            self.is_safe = Some(is_safe);
        }
        if let Some(text) = update.translated_text {
            self.translated_text = Some(text);
        }
        if let Some(audio) = update.audio_bytes {
            self.audio_bytes = Some(audio);
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error_message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Partial state produced by one stage (or one streaming fragment).
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub is_safe: Option<bool>,
    pub translated_text: Option<String>,
    pub audio_bytes: Option<Vec<u8>>,
    pub error_message: Option<String>,
}

impl StateUpdate {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_partial_fields() {
        let mut state = TranslationState::new("Hello", "Spanish");
        state.apply(StateUpdate {
            is_safe: Some(true),
            ..Default::default()
        });
        state.apply(StateUpdate {
            translated_text: Some("Hola".to_string()),
            ..Default::default()
        });

        assert_eq!(state.is_safe, Some(true));
        assert_eq!(state.translated_text.as_deref(), Some("Hola"));
        assert!(state.audio_bytes.is_none());
        assert!(!state.has_error());
    }

    #[test]
    fn test_apply_none_preserves_accumulated_values() {
        let mut state = TranslationState::new("Hello", "Spanish");
        state.apply(StateUpdate {
            is_safe: Some(true),
            translated_text: Some("Hola".to_string()),
            ..Default::default()
        });
        state.apply(StateUpdate::default());

        assert_eq!(state.is_safe, Some(true));
        assert_eq!(state.translated_text.as_deref(), Some("Hola"));
    }

    #[test]
    fn test_streaming_prefix_replacement() {
        let mut state = TranslationState::new("Hello", "Spanish");
        for partial in ["Hola", "Hola, ¿cómo", "Hola, ¿cómo estás hoy?"] {
            state.apply(StateUpdate {
                translated_text: Some(partial.to_string()),
                ..Default::default()
            });
        }
        assert_eq!(
            state.translated_text.as_deref(),
            Some("Hola, ¿cómo estás hoy?")
        );
    }

    #[test]
    fn test_error_with_partial_text_preserved() {
        let mut state = TranslationState::new("Hello", "French");
        state.apply(StateUpdate {
            translated_text: Some("Bonjour".to_string()),
            error_message: Some("translation stream failed".to_string()),
            ..Default::default()
        });

        assert!(state.has_error());
        assert_eq!(state.translated_text.as_deref(), Some("Bonjour"));
    }
}
