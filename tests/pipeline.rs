//! End-to-end pipeline scenarios against scripted providers.

use std::path::Path;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use voxlate::error::{Result, VoxlateError};
use voxlate::language::lookup_voice;
use voxlate::moderation::{CategorySeverity, ModerationAnalysis, Moderator};
use voxlate::speech::{AudioFormat, RecognitionResult, SpeechClient, SynthesisResult};
use voxlate::translate::{ChatRequest, DeltaStream, Translator};
use voxlate::workflow::{Stage, Workflow, WorkflowOptions};

/// Moderator that replays a fixed set of category severities, or errors.
struct ScriptedModerator {
    severities: Vec<(&'static str, u8)>,
    unavailable: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Moderator for ScriptedModerator {
    async fn analyze_text(&self, _text: &str) -> Result<ModerationAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(VoxlateError::Moderation("connection refused".to_string()));
        }
        Ok(ModerationAnalysis {
            categories: self
                .severities
                .iter()
                .map(|(name, severity)| CategorySeverity {
                    name: (*name).to_string(),
                    severity: *severity,
                })
                .collect(),
        })
    }
}

/// Translator that replays a fixed fragment script on every call.
struct ScriptedTranslator {
    script: Vec<std::result::Result<&'static str, &'static str>>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn stream_chat(&self, _request: ChatRequest) -> Result<DeltaStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fragments: Vec<Result<String>> = self
            .script
            .iter()
            .map(|fragment| match fragment {
                Ok(piece) => Ok((*piece).to_string()),
                Err(message) => Err(VoxlateError::Translation((*message).to_string())),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

enum SpeechScript {
    Completed(usize),
    Canceled(&'static str, Option<&'static str>),
    Other(&'static str),
}

struct ScriptedSpeech {
    script: SpeechScript,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SpeechClient for ScriptedSpeech {
    async fn synthesize_to_bytes(
        &self,
        _text: &str,
        _voice_id: &str,
        _format: AudioFormat,
    ) -> Result<SynthesisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.script {
            SpeechScript::Completed(len) => SynthesisResult::Completed { audio: vec![0u8; *len] },
            SpeechScript::Canceled(reason, detail) => SynthesisResult::Canceled {
                reason: (*reason).to_string(),
                error_detail: detail.map(str::to_string),
            },
            SpeechScript::Other(reason) => SynthesisResult::Other {
                reason: (*reason).to_string(),
            },
        })
    }

    async fn recognize_from_file(&self, _path: &Path, _locale: &str) -> Result<RecognitionResult> {
        Ok(RecognitionResult::NoMatch)
    }
}

struct Counters {
    moderation: Arc<AtomicUsize>,
    translation: Arc<AtomicUsize>,
    synthesis: Arc<AtomicUsize>,
}

fn scripted_workflow(
    severities: Vec<(&'static str, u8)>,
    moderation_unavailable: bool,
    script: Vec<std::result::Result<&'static str, &'static str>>,
    speech: SpeechScript,
) -> (Workflow, Counters) {
    let counters = Counters {
        moderation: Arc::new(AtomicUsize::new(0)),
        translation: Arc::new(AtomicUsize::new(0)),
        synthesis: Arc::new(AtomicUsize::new(0)),
    };

    let workflow = Workflow::with_providers(
        Box::new(ScriptedModerator {
            severities,
            unavailable: moderation_unavailable,
            calls: counters.moderation.clone(),
        }),
        Box::new(ScriptedTranslator {
            script,
            calls: counters.translation.clone(),
        }),
        Box::new(ScriptedSpeech {
            script: speech,
            calls: counters.synthesis.clone(),
        }),
        WorkflowOptions::default(),
    );

    (workflow, counters)
}

fn all_zero_severities() -> Vec<(&'static str, u8)> {
    vec![("Hate", 0), ("SelfHarm", 0), ("Sexual", 0), ("Violence", 0)]
}

#[tokio::test]
async fn test_scenario_full_success() {
    let (workflow, counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola"), Ok(", ¿cómo"), Ok(" estás hoy?")],
        SpeechScript::Completed(1000),
    );

    let state = workflow.run("Hello, how are you today?", "Spanish").await;

    assert_eq!(state.is_safe, Some(true));
    assert_eq!(state.translated_text.as_deref(), Some("Hola, ¿cómo estás hoy?"));
    assert_eq!(state.audio_bytes.as_ref().unwrap().len(), 1000);
    assert!(state.error_message.is_none());

    assert_eq!(counters.moderation.load(Ordering::SeqCst), 1);
    assert_eq!(counters.translation.load(Ordering::SeqCst), 1);
    assert_eq!(counters.synthesis.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scenario_unsafe_input_short_circuits() {
    let (workflow, counters) = scripted_workflow(
        vec![("Hate", 0), ("Violence", 4)],
        false,
        vec![Ok("never used")],
        SpeechScript::Completed(1000),
    );

    let state = workflow.run("Hello, how are you today?", "Spanish").await;

    assert_eq!(state.is_safe, Some(false));
    assert!(state.error_message.is_some());
    assert!(state.translated_text.is_none());
    assert!(state.audio_bytes.is_none());

    assert_eq!(counters.translation.load(Ordering::SeqCst), 0);
    assert_eq!(counters.synthesis.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scenario_mid_stream_failure_keeps_partial_translation() {
    let (workflow, counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Bonjour"), Err("stream reset by provider")],
        SpeechScript::Completed(1000),
    );

    let state = workflow.run("Hello, how are you today?", "French").await;

    assert_eq!(state.translated_text.as_deref(), Some("Bonjour"));
    assert!(state.error_message.as_deref().unwrap().contains("stream reset"));
    assert!(state.audio_bytes.is_none());
    assert_eq!(counters.synthesis.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_moderation_outage_fails_open() {
    let (workflow, counters) = scripted_workflow(
        Vec::new(),
        true,
        vec![Ok("Hola")],
        SpeechScript::Completed(16),
    );

    let state = workflow.run("Hello", "Spanish").await;

    assert_eq!(state.is_safe, Some(true));
    assert_eq!(state.translated_text.as_deref(), Some("Hola"));
    assert!(state.audio_bytes.is_some());
    assert!(!state.has_error());
    assert_eq!(counters.translation.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_input_terminates_before_translation() {
    let (workflow, counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("never used")],
        SpeechScript::Completed(16),
    );

    let state = workflow.run("", "Spanish").await;

    assert_eq!(state.is_safe, Some(false));
    assert!(state.error_message.as_deref().unwrap().contains("missing"));
    assert_eq!(counters.moderation.load(Ordering::SeqCst), 0);
    assert_eq!(counters.translation.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unsupported_language_rejected_by_synthesis() {
    // Translation itself has no language table; the synthesis stage is the
    // gatekeeper for unknown language names.
    let (workflow, counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("tlhIngan Hol")],
        SpeechScript::Completed(16),
    );

    let state = workflow.run("Hello", "Klingon").await;

    assert_eq!(state.translated_text.as_deref(), Some("tlhIngan Hol"));
    assert!(state
        .error_message
        .as_deref()
        .unwrap()
        .contains("'Klingon' is not supported"));
    assert!(state.audio_bytes.is_none());
    assert_eq!(counters.synthesis.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unsupported_language_rejected_by_lookup() {
    // The other entry point: callers validating up front never reach the
    // pipeline at all.
    assert!(lookup_voice("Klingon").is_none());
}

#[tokio::test]
async fn test_synthesis_cancellation_surfaces_detail() {
    let (workflow, _counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola")],
        SpeechScript::Canceled("Error", Some("quota exceeded")),
    );

    let state = workflow.run("Hello", "Spanish").await;

    let message = state.error_message.unwrap();
    assert!(message.contains("Speech synthesis canceled: Error"));
    assert!(message.contains("quota exceeded"));
    assert!(state.audio_bytes.is_none());
    assert_eq!(state.translated_text.as_deref(), Some("Hola"));
}

#[tokio::test]
async fn test_synthesis_unknown_reason_is_reported_literally() {
    let (workflow, _counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola")],
        SpeechScript::Other("AudioStarted"),
    );

    let state = workflow.run("Hello", "Spanish").await;

    assert!(state
        .error_message
        .unwrap()
        .contains("unexpected reason: AudioStarted"));
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let (workflow, _counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola"), Ok(" mundo")],
        SpeechScript::Completed(64),
    );

    let first = workflow.run("Hello world", "Spanish").await;
    let second = workflow.run("Hello world", "Spanish").await;

    assert_eq!(first.translated_text, second.translated_text);
    assert_eq!(
        first.audio_bytes.map(|a| a.len()),
        second.audio_bytes.map(|a| a.len())
    );
}

#[tokio::test]
async fn test_streaming_updates_are_prefix_monotonic() {
    let (workflow, _counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola"), Ok(", ¿cómo"), Ok(" estás hoy?")],
        SpeechScript::Completed(1000),
    );

    let events = workflow.stream("Hello, how are you today?", "Spanish");
    let mut events = pin!(events);

    let mut previous = String::new();
    let mut translation_events = 0;
    let mut last_state = None;

    while let Some(event) = events.next().await {
        if event.stage == Stage::Translate {
            let text = event.state.translated_text.as_deref().unwrap().to_string();
            assert!(
                text.starts_with(&previous),
                "update '{}' is not a prefix-extension of '{}'",
                text,
                previous
            );
            previous = text;
            translation_events += 1;
        }
        last_state = Some(event.state);
    }

    // Three fragments plus the completion update
    assert_eq!(translation_events, 4);
    assert_eq!(previous, "Hola, ¿cómo estás hoy?");

    // Stream exhaustion is the end-of-run signal; the last snapshot is the
    // complete final state.
    let last_state = last_state.unwrap();
    assert_eq!(last_state.audio_bytes.unwrap().len(), 1000);
    assert!(last_state.error_message.is_none());
}

#[tokio::test]
async fn test_streaming_yields_one_event_per_stage_update() {
    let (workflow, _counters) = scripted_workflow(
        all_zero_severities(),
        false,
        vec![Ok("Hola")],
        SpeechScript::Completed(8),
    );

    let events = workflow.stream("Hello", "Spanish");
    let stages: Vec<Stage> = events.map(|event| event.stage).collect().await;

    assert_eq!(
        stages,
        vec![
            Stage::Safety,
            Stage::Translate, // fragment
            Stage::Translate, // completion update
            Stage::Synthesize,
        ]
    );
}
