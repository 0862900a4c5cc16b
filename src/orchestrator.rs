//! Conversation turn orchestration
//!
//! Drives one press-and-hold question through the full pipeline:
//! record, transcribe, compose a persona prompt, generate a reply,
//! synthesize it, and start playback. One turn at a time; a press
//! while a turn is still in flight is rejected, never interleaved.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::chat::{ChatClient, ChatMessage};
use crate::persona::Persona;
use crate::prompt::build_chef_prompt;
use crate::recipe::RecipeContext;
use crate::voice::capture::{AudioCapture, AudioClip};
use crate::voice::playback::PlaybackController;
use crate::voice::stt::SpeechTranscriber;
use crate::voice::tts::VoiceSynthesizer;
use crate::{Error, Result};

/// Default per-stage timeout for external calls
pub const STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the orchestrator is within the current turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Recording,
    Transcribing,
    Composing,
    AwaitingReply,
    Synthesizing,
    Playing,
}

/// Which use the audio hardware is currently configured for
///
/// Owned by the orchestrator alone; capture and playback never touch
/// it themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioMode {
    Recording,
    Playback,
}

/// How a released turn ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Reply synthesized and playback started
    Played { transcript: String, reply: String },
    /// No clip was recorded (double release, or nothing captured)
    NoClip,
    /// The clip transcribed to empty text
    NothingSaid,
    /// The model returned no reply content
    NoReply,
}

/// Records a question clip
pub trait Recorder {
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened
    fn start(&mut self) -> Result<()>;

    /// # Errors
    ///
    /// Returns error if the clip cannot be finalized
    fn stop(&mut self) -> Result<Option<AudioClip>>;
}

/// Turns a recorded clip into text
#[async_trait]
pub trait Transcribe {
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

/// Produces the chef's reply to a question
#[async_trait]
pub trait GenerateReply {
    /// Returns `Ok(None)` when the model produced no content
    ///
    /// # Errors
    ///
    /// Returns error if the completion call fails
    async fn generate(&self, system_prompt: &str, utterance: &str) -> Result<Option<String>>;
}

/// Turns reply text into an audio clip on disk
#[async_trait]
pub trait Synthesize {
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf>;
}

/// Starts playback of a reply clip
pub trait Player {
    /// # Errors
    ///
    /// Returns error if the clip cannot be played
    fn play(&mut self, path: &Path) -> Result<()>;
}

impl Recorder for AudioCapture {
    fn start(&mut self) -> Result<()> {
        Self::start(self)
    }

    fn stop(&mut self) -> Result<Option<AudioClip>> {
        Self::stop(self)
    }
}

#[async_trait]
impl Transcribe for SpeechTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        self.transcribe_file(&clip.path).await
    }
}

#[async_trait]
impl GenerateReply for ChatClient {
    async fn generate(&self, system_prompt: &str, utterance: &str) -> Result<Option<String>> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(utterance)];
        self.complete(&messages, false).await
    }
}

#[async_trait]
impl Synthesize for VoiceSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf> {
        self.synthesize_to_file(text, voice_id).await
    }
}

impl Player for PlaybackController {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.play_file(path)
    }
}

/// Drives the question/reply pipeline for one chef session
pub struct ConversationOrchestrator<R, T, G, S, P> {
    recorder: R,
    transcriber: T,
    generator: G,
    synthesizer: S,
    player: P,
    state: TurnState,
    audio_mode: AudioMode,
    stage_timeout: Duration,
}

impl<R, T, G, S, P> ConversationOrchestrator<R, T, G, S, P>
where
    R: Recorder,
    T: Transcribe,
    G: GenerateReply,
    S: Synthesize,
    P: Player,
{
    pub fn new(recorder: R, transcriber: T, generator: G, synthesizer: S, player: P) -> Self {
        Self {
            recorder,
            transcriber,
            generator,
            synthesizer,
            player,
            state: TurnState::Idle,
            audio_mode: AudioMode::Playback,
            stage_timeout: STAGE_TIMEOUT,
        }
    }

    /// Override the per-stage timeout
    #[must_use]
    pub const fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Current pipeline position
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Current hardware mode
    #[must_use]
    pub const fn audio_mode(&self) -> AudioMode {
        self.audio_mode
    }

    /// Begin recording a question (press gesture)
    ///
    /// Returns `Ok(false)` when a turn is already in flight; the
    /// gesture is dropped rather than queued so the microphone and
    /// speaker are never contended.
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened; the
    /// orchestrator is back at idle afterwards
    pub fn press(&mut self) -> Result<bool> {
        if self.state != TurnState::Idle {
            tracing::warn!(state = ?self.state, "press ignored, turn in flight");
            return Ok(false);
        }

        self.audio_mode = AudioMode::Recording;
        self.state = TurnState::Recording;

        if let Err(e) = self.recorder.start() {
            tracing::error!(error = %e, "could not start recording");
            self.state = TurnState::Idle;
            self.audio_mode = AudioMode::Playback;
            return Err(e);
        }

        Ok(true)
    }

    /// Finish recording and run the turn to completion (release gesture)
    ///
    /// A release with no active recording is a no-op returning
    /// [`TurnOutcome::NoClip`]. Whatever happens, the orchestrator is
    /// idle again when this returns.
    ///
    /// # Errors
    ///
    /// Returns error if any pipeline stage fails or times out
    #[allow(clippy::future_not_send)]
    pub async fn release(
        &mut self,
        persona: &Persona,
        ctx: &RecipeContext,
    ) -> Result<TurnOutcome> {
        let turn_id = Uuid::new_v4();
        let result = self.run_turn(turn_id, persona, ctx).await;
        self.state = TurnState::Idle;
        if let Err(e) = &result {
            tracing::error!(%turn_id, error = %e, "turn failed");
        }
        result
    }

    #[allow(clippy::future_not_send)]
    async fn run_turn(
        &mut self,
        turn_id: Uuid,
        persona: &Persona,
        ctx: &RecipeContext,
    ) -> Result<TurnOutcome> {
        if self.state != TurnState::Recording {
            // Double release; the recorder was never started.
            return Ok(TurnOutcome::NoClip);
        }

        self.state = TurnState::Transcribing;
        let Some(clip) = self.recorder.stop()? else {
            tracing::debug!(%turn_id, "release with no clip");
            return Ok(TurnOutcome::NoClip);
        };

        tracing::debug!(%turn_id, duration_ms = clip.duration_ms, "clip recorded");

        let transcript = self
            .staged(self.transcriber.transcribe(&clip), Error::Transcription)
            .await?;
        if transcript.trim().is_empty() {
            tracing::info!(%turn_id, "nothing said, ending turn");
            return Ok(TurnOutcome::NothingSaid);
        }

        self.state = TurnState::Composing;
        let system_prompt = build_chef_prompt(persona, ctx);

        self.state = TurnState::AwaitingReply;
        let reply = self
            .staged(self.generator.generate(&system_prompt, &transcript), Error::Generation)
            .await?;
        let Some(reply) = reply.filter(|r| !r.trim().is_empty()) else {
            tracing::info!(%turn_id, "model returned no reply, ending turn");
            return Ok(TurnOutcome::NoReply);
        };

        self.state = TurnState::Synthesizing;
        let clip_path = self
            .staged(self.synthesizer.synthesize(&reply, &persona.voice_id), Error::Synthesis)
            .await?;

        self.state = TurnState::Playing;
        self.audio_mode = AudioMode::Playback;
        self.player.play(&clip_path)?;

        tracing::info!(%turn_id, chef = %persona.name, "reply playing");
        Ok(TurnOutcome::Played { transcript, reply })
    }

    /// Read the current recipe step aloud in the chef's voice
    ///
    /// Uses the same busy guard as a question turn.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    #[allow(clippy::future_not_send)]
    pub async fn narrate_step(&mut self, persona: &Persona, ctx: &RecipeContext) -> Result<bool> {
        if self.state != TurnState::Idle {
            tracing::warn!(state = ?self.state, "narration ignored, turn in flight");
            return Ok(false);
        }

        let step = ctx.current_step();
        if step.is_empty() {
            return Ok(false);
        }

        self.state = TurnState::Synthesizing;
        let result = self
            .staged(self.synthesizer.synthesize(step, &persona.voice_id), Error::Synthesis)
            .await;

        let outcome = match result {
            Ok(path) => {
                self.state = TurnState::Playing;
                self.audio_mode = AudioMode::Playback;
                self.player.play(&path).map(|()| true)
            }
            Err(e) => Err(e),
        };

        self.state = TurnState::Idle;
        outcome
    }

    /// Run a stage under the bounded timeout, mapping a timeout to
    /// that stage's failure kind
    async fn staged<F, V>(&self, fut: F, on_timeout: fn(String) -> Error) -> Result<V>
    where
        F: std::future::Future<Output = Result<V>>,
    {
        match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(format!(
                "stage timed out after {}s",
                self.stage_timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::persona::builtin_personas;

    fn test_persona() -> Persona {
        builtin_personas().remove(0)
    }

    fn test_ctx() -> RecipeContext {
        RecipeContext {
            title: "Carbonara".to_string(),
            description: "Roman classic".to_string(),
            steps: vec![
                "Boil the pasta.".to_string(),
                "Whisk eggs and cheese.".to_string(),
            ],
            step_index: 0,
        }
    }

    struct FakeRecorder {
        clip: Option<AudioClip>,
        started: Arc<AtomicUsize>,
    }

    impl Recorder for FakeRecorder {
        fn start(&mut self) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) -> Result<Option<AudioClip>> {
            Ok(self.clip.take())
        }
    }

    struct FakeTranscriber {
        text: Result<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transcribe for FakeTranscriber {
        async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.text {
                Ok(t) => Ok(t.clone()),
                Err(_) => Err(Error::Transcription("stt down".to_string())),
            }
        }
    }

    struct FakeGenerator {
        reply: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GenerateReply for FakeGenerator {
        async fn generate(&self, _system: &str, _utterance: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FakeSynthesizer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Synthesize for FakeSynthesizer {
        async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::from("/tmp/tts.mp3"))
        }
    }

    struct FakePlayer {
        calls: Arc<AtomicUsize>,
    }

    impl Player for FakePlayer {
        fn play(&mut self, _path: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Counters {
        started: Arc<AtomicUsize>,
        transcribed: Arc<AtomicUsize>,
        generated: Arc<AtomicUsize>,
        synthesized: Arc<AtomicUsize>,
        played: Arc<AtomicUsize>,
    }

    fn orchestrator(
        clip: bool,
        transcript: Result<String>,
        reply: Option<String>,
    ) -> (
        ConversationOrchestrator<
            FakeRecorder,
            FakeTranscriber,
            FakeGenerator,
            FakeSynthesizer,
            FakePlayer,
        >,
        Counters,
    ) {
        let counters = Counters {
            started: Arc::new(AtomicUsize::new(0)),
            transcribed: Arc::new(AtomicUsize::new(0)),
            generated: Arc::new(AtomicUsize::new(0)),
            synthesized: Arc::new(AtomicUsize::new(0)),
            played: Arc::new(AtomicUsize::new(0)),
        };

        let orchestrator = ConversationOrchestrator::new(
            FakeRecorder {
                clip: clip.then(|| AudioClip {
                    path: PathBuf::from("/tmp/question.wav"),
                    duration_ms: 1200,
                }),
                started: Arc::clone(&counters.started),
            },
            FakeTranscriber {
                text: transcript,
                calls: Arc::clone(&counters.transcribed),
            },
            FakeGenerator {
                reply,
                calls: Arc::clone(&counters.generated),
            },
            FakeSynthesizer {
                calls: Arc::clone(&counters.synthesized),
            },
            FakePlayer {
                calls: Arc::clone(&counters.played),
            },
        );

        (orchestrator, counters)
    }

    #[tokio::test]
    async fn full_turn_reaches_playback() {
        let (mut orch, counters) = orchestrator(
            true,
            Ok("how long do I boil it?".to_string()),
            Some("About ten minutes, and salt that water!".to_string()),
        );

        assert!(orch.press().unwrap());
        let outcome = orch.release(&test_persona(), &test_ctx()).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Played { .. }));
        assert_eq!(orch.state(), TurnState::Idle);
        assert_eq!(orch.audio_mode(), AudioMode::Playback);
        assert_eq!(counters.played.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_transcript_skips_generation() {
        let (mut orch, counters) = orchestrator(true, Ok(String::new()), None);

        orch.press().unwrap();
        let outcome = orch.release(&test_persona(), &test_ctx()).await.unwrap();

        assert_eq!(outcome, TurnOutcome::NothingSaid);
        assert_eq!(counters.generated.load(Ordering::SeqCst), 0);
        assert_eq!(counters.synthesized.load(Ordering::SeqCst), 0);
        assert_eq!(counters.played.load(Ordering::SeqCst), 0);
        assert_eq!(orch.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn transcription_failure_stops_pipeline() {
        let (mut orch, counters) = orchestrator(
            true,
            Err(Error::Transcription("stt down".to_string())),
            Some("unused".to_string()),
        );

        orch.press().unwrap();
        let result = orch.release(&test_persona(), &test_ctx()).await;

        assert!(matches!(result, Err(Error::Transcription(_))));
        assert_eq!(counters.synthesized.load(Ordering::SeqCst), 0);
        assert_eq!(counters.played.load(Ordering::SeqCst), 0);
        assert_eq!(orch.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn empty_reply_ends_turn_without_playback() {
        let (mut orch, counters) = orchestrator(true, Ok("hello?".to_string()), None);

        orch.press().unwrap();
        let outcome = orch.release(&test_persona(), &test_ctx()).await.unwrap();

        assert_eq!(outcome, TurnOutcome::NoReply);
        assert_eq!(counters.generated.load(Ordering::SeqCst), 1);
        assert_eq!(counters.synthesized.load(Ordering::SeqCst), 0);
        assert_eq!(counters.played.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn release_without_clip_is_noop() {
        let (mut orch, counters) = orchestrator(false, Ok("unused".to_string()), None);

        orch.press().unwrap();
        let outcome = orch.release(&test_persona(), &test_ctx()).await.unwrap();

        assert_eq!(outcome, TurnOutcome::NoClip);
        assert_eq!(counters.transcribed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn double_release_is_harmless() {
        let (mut orch, _) = orchestrator(true, Ok("hi".to_string()), Some("Yes?".to_string()));

        orch.press().unwrap();
        orch.release(&test_persona(), &test_ctx()).await.unwrap();
        let second = orch.release(&test_persona(), &test_ctx()).await.unwrap();

        assert_eq!(second, TurnOutcome::NoClip);
    }

    #[tokio::test]
    async fn press_while_recording_is_rejected() {
        let (mut orch, counters) = orchestrator(true, Ok("hi".to_string()), None);

        assert!(orch.press().unwrap());
        assert!(!orch.press().unwrap());
        assert_eq!(counters.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn narration_plays_current_step() {
        let (mut orch, counters) = orchestrator(false, Ok(String::new()), None);

        let played = orch.narrate_step(&test_persona(), &test_ctx()).await.unwrap();

        assert!(played);
        assert_eq!(counters.synthesized.load(Ordering::SeqCst), 1);
        assert_eq!(counters.played.load(Ordering::SeqCst), 1);
        assert_eq!(orch.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn failed_microphone_leaves_orchestrator_fully_idle() {
        struct DeniedRecorder;

        impl Recorder for DeniedRecorder {
            fn start(&mut self) -> Result<()> {
                Err(Error::Permission("microphone access denied".to_string()))
            }

            fn stop(&mut self) -> Result<Option<AudioClip>> {
                Ok(None)
            }
        }

        let (fast, counters) = orchestrator(false, Ok(String::new()), None);
        drop(fast);

        let mut orch = ConversationOrchestrator::new(
            DeniedRecorder,
            FakeTranscriber {
                text: Ok(String::new()),
                calls: Arc::clone(&counters.transcribed),
            },
            FakeGenerator {
                reply: None,
                calls: Arc::clone(&counters.generated),
            },
            FakeSynthesizer {
                calls: Arc::clone(&counters.synthesized),
            },
            FakePlayer {
                calls: Arc::clone(&counters.played),
            },
        );

        let result = orch.press();

        assert!(matches!(result, Err(Error::Permission(_))));
        assert_eq!(orch.state(), TurnState::Idle);
        assert_eq!(orch.audio_mode(), AudioMode::Playback);
    }

    #[tokio::test]
    async fn timed_out_stage_maps_to_stage_error() {
        struct SlowTranscriber;

        #[async_trait]
        impl Transcribe for SlowTranscriber {
            async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }
        }

        let (fast, counters) = orchestrator(true, Ok(String::new()), None);
        drop(fast);

        let mut orch = ConversationOrchestrator::new(
            FakeRecorder {
                clip: Some(AudioClip {
                    path: PathBuf::from("/tmp/question.wav"),
                    duration_ms: 900,
                }),
                started: Arc::clone(&counters.started),
            },
            SlowTranscriber,
            FakeGenerator {
                reply: None,
                calls: Arc::clone(&counters.generated),
            },
            FakeSynthesizer {
                calls: Arc::clone(&counters.synthesized),
            },
            FakePlayer {
                calls: Arc::clone(&counters.played),
            },
        )
        .with_stage_timeout(Duration::from_millis(50));

        orch.press().unwrap();
        let result = orch.release(&test_persona(), &test_ctx()).await;

        assert!(matches!(result, Err(Error::Transcription(_))));
        assert_eq!(orch.state(), TurnState::Idle);
    }
}
