//! The translate-and-speak pipeline: safety check → streaming translation →
//! speech synthesis, with early exit at each gate.

use std::pin::pin;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::language::lookup_voice;
use crate::moderation::{Moderator, ModeratorFactory};
use crate::speech::{AudioFormat, SpeechClient, SpeechClientFactory, SynthesisResult};
use crate::state::{StateUpdate, TranslationState};
use crate::translate::{translation_prompt, ChatRequest, Translator, TranslatorFactory};

/// Ceiling on stage transitions per run. The rule set is acyclic, so a run
/// that reaches this limit has hit a defect, not a long pipeline.
pub const MAX_TRANSITIONS: usize = 25;

/// Pipeline position. A run always moves forward: safety, then translation,
/// then synthesis, ending early when a gate fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Safety,
    Translate,
    Synthesize,
    End,
}

/// Gate after the safety stage: translate only safe, error-free input.
pub fn next_after_safety(state: &TranslationState) -> Stage {
    if state.is_safe == Some(true) && !state.has_error() {
        Stage::Translate
    } else {
        Stage::End
    }
}

/// Gate after the translation stage: synthesize only a non-empty,
/// error-free translation.
pub fn next_after_translation(state: &TranslationState) -> Stage {
    let translated = state
        .translated_text
        .as_deref()
        .is_some_and(|t| !t.is_empty());
    if translated && !state.has_error() {
        Stage::Synthesize
    } else {
        Stage::End
    }
}

/// Snapshot of the accumulated state after one stage update.
#[derive(Debug, Clone)]
pub struct WorkflowEvent {
    /// Stage that produced the update
    pub stage: Stage,
    /// Merged state after applying the update
    pub state: TranslationState,
}

/// Tunables the stages read; factored out of `Config` so tests can inject
/// providers without building one.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Any moderation category severity above this flags the input as unsafe
    pub severity_floor: u8,
    /// Translation sampling temperature
    pub temperature: f32,
    /// Translation output token cap
    pub max_tokens: u32,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            severity_floor: 0,
            temperature: 0.3,
            max_tokens: 250,
        }
    }
}

pub struct Workflow {
    moderator: Box<dyn Moderator>,
    translator: Box<dyn Translator>,
    speech: Box<dyn SpeechClient>,
    options: WorkflowOptions,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let options = WorkflowOptions {
            severity_floor: config.moderation.severity_floor,
            temperature: config.translate.temperature,
            max_tokens: config.translate.max_tokens,
        };

        Ok(Self {
            moderator: ModeratorFactory::create(config.moderation)?,
            translator: TranslatorFactory::create(config.translate)?,
            speech: SpeechClientFactory::create(config.speech)?,
            options,
        })
    }

    /// Build a workflow from explicit provider instances.
    pub fn with_providers(
        moderator: Box<dyn Moderator>,
        translator: Box<dyn Translator>,
        speech: Box<dyn SpeechClient>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            moderator,
            translator,
            speech,
            options,
        }
    }

    /// Run the pipeline to completion and return the final merged state.
    pub async fn run(
        &self,
        original_text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> TranslationState {
        let original_text = original_text.into();
        let target_language = target_language.into();

        let mut final_state =
            TranslationState::new(original_text.as_str(), target_language.as_str());
        let events = self.stream(original_text, target_language);
        let mut events = pin!(events);
        while let Some(event) = events.next().await {
            final_state = event.state;
        }
        final_state
    }

    /// Run the pipeline incrementally. Yields a snapshot of the merged state
    /// after every stage update, one per translation fragment; stream
    /// exhaustion signals the end of the run.
    pub fn stream(
        &self,
        original_text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> impl Stream<Item = WorkflowEvent> + Send + '_ {
        let original_text = original_text.into();
        let target_language = target_language.into();

        stream! {
            let mut state = TranslationState::new(original_text, target_language);
            let mut stage = Stage::Safety;
            let mut transitions = 0usize;

            loop {
                transitions += 1;
                if transitions > MAX_TRANSITIONS {
                    warn!("Transition ceiling of {} reached", MAX_TRANSITIONS);
                    state.apply(StateUpdate::error("Workflow exceeded the transition limit"));
                    yield WorkflowEvent { stage, state: state.clone() };
                    return;
                }

                match stage {
                    Stage::Safety => {
                        let update = self.check_safety(&state).await;
                        state.apply(update);
                        yield WorkflowEvent { stage: Stage::Safety, state: state.clone() };
                        stage = next_after_safety(&state);
                    }
                    Stage::Translate => {
                        {
                            let updates = self.translation_updates(
                                state.original_text.clone(),
                                state.target_language.clone(),
                            );
                            let mut updates = pin!(updates);
                            while let Some(update) = updates.next().await {
                                state.apply(update);
                                yield WorkflowEvent { stage: Stage::Translate, state: state.clone() };
                            }
                        }
                        stage = next_after_translation(&state);
                    }
                    Stage::Synthesize => {
                        let update = self.synthesize_speech(&state).await;
                        state.apply(update);
                        yield WorkflowEvent { stage: Stage::Synthesize, state: state.clone() };
                        stage = Stage::End;
                    }
                    Stage::End => return,
                }
            }
        }
    }

    /// Safety stage: one moderation call, flagging the input unsafe if any
    /// category severity exceeds the floor. An unreachable moderation service
    /// fails open: the pipeline continues rather than blocking on an
    /// unavailable dependency.
    async fn check_safety(&self, state: &TranslationState) -> StateUpdate {
        info!("Running content safety check");

        if state.original_text.is_empty() {
            return StateUpdate {
                is_safe: Some(false),
                error_message: Some("Input text is missing for the safety check".to_string()),
                ..Default::default()
            };
        }

        match self.moderator.analyze_text(&state.original_text).await {
            Ok(analysis) => {
                if let Some(flagged) = analysis.flagged_above(self.options.severity_floor) {
                    warn!(
                        "Content flagged as unsafe: {} (severity {})",
                        flagged.name, flagged.severity
                    );
                    StateUpdate {
                        is_safe: Some(false),
                        error_message: Some("Input text was found to be unsafe".to_string()),
                        ..Default::default()
                    }
                } else {
                    StateUpdate {
                        is_safe: Some(true),
                        ..Default::default()
                    }
                }
            }
            Err(e) => {
                warn!("Moderation unavailable, continuing without safety check: {}", e);
                StateUpdate {
                    is_safe: Some(true),
                    ..Default::default()
                }
            }
        }
    }

    /// Translation stage: consumes the provider's delta stream, yielding one
    /// update with the cumulative text per fragment. On mid-stream failure
    /// the accumulated partial text stays in the update alongside the error.
    fn translation_updates(
        &self,
        original_text: String,
        target_language: String,
    ) -> impl Stream<Item = StateUpdate> + Send + '_ {
        stream! {
            if original_text.is_empty() || target_language.is_empty() {
                yield StateUpdate::error(
                    "Original text or target language is missing for translation",
                );
                return;
            }

            info!("Streaming translation to {}", target_language);

            let request = ChatRequest {
                system_prompt: translation_prompt(&target_language),
                user_text: original_text,
                temperature: self.options.temperature,
                max_tokens: self.options.max_tokens,
            };

            let mut deltas = match self.translator.stream_chat(request).await {
                Ok(deltas) => deltas,
                Err(e) => {
                    yield StateUpdate::error(format!("Translation failed: {}", e));
                    return;
                }
            };

            let mut accumulated = String::new();
            while let Some(fragment) = deltas.next().await {
                match fragment {
                    Ok(piece) => {
                        accumulated.push_str(&piece);
                        yield StateUpdate {
                            translated_text: Some(accumulated.clone()),
                            ..Default::default()
                        };
                    }
                    Err(e) => {
                        yield StateUpdate {
                            translated_text: Some(accumulated.clone()),
                            error_message: Some(format!("Translation failed: {}", e)),
                            ..Default::default()
                        };
                        return;
                    }
                }
            }

            info!("Translation stream completed: {} characters", accumulated.len());
            yield StateUpdate {
                translated_text: Some(accumulated),
                ..Default::default()
            };
        }
    }

    /// Synthesis stage: resolves the voice from the static language table and
    /// requests MP3 bytes, mapping each normalized outcome to its own state
    /// transition.
    async fn synthesize_speech(&self, state: &TranslationState) -> StateUpdate {
        let Some(text) = state.translated_text.as_deref().filter(|t| !t.is_empty()) else {
            return StateUpdate::error("Translated text is missing for speech synthesis");
        };

        if state.target_language.is_empty() {
            return StateUpdate::error("Target language is missing for speech synthesis");
        }

        let Some(language) = lookup_voice(&state.target_language) else {
            return StateUpdate::error(format!(
                "Language '{}' is not supported for speech synthesis",
                state.target_language
            ));
        };

        info!("Synthesizing speech with voice {}", language.voice);

        match self
            .speech
            .synthesize_to_bytes(text, language.voice, AudioFormat::Mp3Mono16Khz32Kbps)
            .await
        {
            Ok(SynthesisResult::Completed { audio }) => {
                info!("Speech synthesis completed: {} bytes", audio.len());
                StateUpdate {
                    audio_bytes: Some(audio),
                    ..Default::default()
                }
            }
            Ok(SynthesisResult::Canceled { reason, error_detail }) => {
                let mut message = format!("Speech synthesis canceled: {}", reason);
                if let Some(detail) = error_detail {
                    message.push_str(&format!(" - Error details: {}", detail));
                }
                StateUpdate::error(message)
            }
            Ok(SynthesisResult::Other { reason }) => StateUpdate::error(format!(
                "Speech synthesis failed with unexpected reason: {}",
                reason
            )),
            Err(e) => StateUpdate::error(format!("Text-to-speech failed: {}", e)),
        }
    }
}
