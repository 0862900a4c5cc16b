//! Conversation pipeline integration tests
//!
//! Exercises the full turn state machine with fake stages, so no
//! audio hardware or network is needed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_test::assert_ok;

use souschef::orchestrator::{
    ConversationOrchestrator, GenerateReply, Player, Recorder, Synthesize, Transcribe,
};
use souschef::voice::AudioClip;
use souschef::{AudioMode, Error, Result, TurnOutcome, TurnState, builtin_personas};

#[derive(Default)]
struct CallLog {
    transcribe: AtomicUsize,
    generate: AtomicUsize,
    synthesize: AtomicUsize,
    synthesize_args: Mutex<Vec<(String, String)>>,
    play: AtomicUsize,
}

struct Stages {
    log: Arc<CallLog>,
    transcript: Result<String>,
    reply: Result<Option<String>>,
    synthesis: Result<PathBuf>,
}

struct StubRecorder {
    clip: Option<AudioClip>,
}

impl Recorder for StubRecorder {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<AudioClip>> {
        Ok(self.clip.take())
    }
}

struct StubTranscriber {
    log: Arc<CallLog>,
    result: Result<String>,
}

#[async_trait]
impl Transcribe for StubTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
        self.log.transcribe.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.result)
    }
}

struct StubGenerator {
    log: Arc<CallLog>,
    result: Result<Option<String>>,
}

#[async_trait]
impl GenerateReply for StubGenerator {
    async fn generate(&self, system_prompt: &str, utterance: &str) -> Result<Option<String>> {
        assert!(!system_prompt.is_empty());
        assert!(!utterance.is_empty());
        self.log.generate.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.result)
    }
}

struct StubSynthesizer {
    log: Arc<CallLog>,
    result: Result<PathBuf>,
}

#[async_trait]
impl Synthesize for StubSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf> {
        self.log
            .synthesize_args
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.to_string()));
        self.log.synthesize.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.result)
    }
}

struct StubPlayer {
    log: Arc<CallLog>,
}

impl Player for StubPlayer {
    fn play(&mut self, _path: &Path) -> Result<()> {
        self.log.play.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn clone_result<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(Error::Generation(e.to_string())),
    }
}

fn clip() -> AudioClip {
    AudioClip {
        path: PathBuf::from("/tmp/question.wav"),
        duration_ms: 1500,
    }
}

fn build(
    stages: Stages,
    with_clip: bool,
) -> ConversationOrchestrator<StubRecorder, StubTranscriber, StubGenerator, StubSynthesizer, StubPlayer>
{
    ConversationOrchestrator::new(
        StubRecorder {
            clip: with_clip.then(clip),
        },
        StubTranscriber {
            log: Arc::clone(&stages.log),
            result: stages.transcript,
        },
        StubGenerator {
            log: Arc::clone(&stages.log),
            result: stages.reply,
        },
        StubSynthesizer {
            log: Arc::clone(&stages.log),
            result: stages.synthesis,
        },
        StubPlayer {
            log: Arc::clone(&stages.log),
        },
    )
}

fn happy_stages(log: &Arc<CallLog>) -> Stages {
    Stages {
        log: Arc::clone(log),
        transcript: Ok("can I swap the cream for milk?".to_string()),
        reply: Ok(Some("Milk works, it'll just be a bit thinner.".to_string())),
        synthesis: Ok(PathBuf::from("/tmp/tts.mp3")),
    }
}

#[tokio::test]
async fn happy_path_invokes_every_stage_once() {
    let log = Arc::new(CallLog::default());
    let mut orch = build(happy_stages(&log), true);
    let chef = &builtin_personas()[0];
    let ctx = recipe_ctx();

    assert!(orch.press().unwrap());
    assert_eq!(orch.state(), TurnState::Recording);
    assert_eq!(orch.audio_mode(), AudioMode::Recording);

    let outcome = assert_ok!(orch.release(chef, &ctx).await);

    match outcome {
        TurnOutcome::Played { transcript, reply } => {
            assert_eq!(transcript, "can I swap the cream for milk?");
            assert!(reply.contains("Milk works"));
        }
        other => panic!("expected Played, got {other:?}"),
    }

    assert_eq!(log.transcribe.load(Ordering::SeqCst), 1);
    assert_eq!(log.generate.load(Ordering::SeqCst), 1);
    assert_eq!(log.synthesize.load(Ordering::SeqCst), 1);
    assert_eq!(log.play.load(Ordering::SeqCst), 1);

    // The synthesizer must get the reply verbatim, voiced as the
    // active chef
    let synth_args = log.synthesize_args.lock().unwrap();
    assert_eq!(
        synth_args.as_slice(),
        &[(
            "Milk works, it'll just be a bit thinner.".to_string(),
            chef.voice_id.clone(),
        )]
    );
    drop(synth_args);

    assert_eq!(orch.state(), TurnState::Idle);
    assert_eq!(orch.audio_mode(), AudioMode::Playback);
}

#[tokio::test]
async fn empty_transcription_short_circuits_before_generation() {
    let log = Arc::new(CallLog::default());
    let mut orch = build(
        Stages {
            log: Arc::clone(&log),
            transcript: Ok("   ".to_string()),
            reply: Ok(Some("unused".to_string())),
            synthesis: Ok(PathBuf::from("/tmp/tts.mp3")),
        },
        true,
    );
    let chef = &builtin_personas()[0];

    orch.press().unwrap();
    let outcome = assert_ok!(orch.release(chef, &recipe_ctx()).await);

    assert_eq!(outcome, TurnOutcome::NothingSaid);
    assert_eq!(log.transcribe.load(Ordering::SeqCst), 1);
    assert_eq!(log.generate.load(Ordering::SeqCst), 0);
    assert_eq!(log.synthesize.load(Ordering::SeqCst), 0);
    assert_eq!(log.play.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transcription_failure_never_reaches_synthesis_or_playback() {
    let log = Arc::new(CallLog::default());
    let mut orch = build(
        Stages {
            log: Arc::clone(&log),
            transcript: Err(Error::Transcription("service unavailable".to_string())),
            reply: Ok(Some("unused".to_string())),
            synthesis: Ok(PathBuf::from("/tmp/tts.mp3")),
        },
        true,
    );
    let chef = &builtin_personas()[0];

    orch.press().unwrap();
    let result = orch.release(chef, &recipe_ctx()).await;

    assert!(result.is_err());
    assert_eq!(log.synthesize.load(Ordering::SeqCst), 0);
    assert_eq!(log.play.load(Ordering::SeqCst), 0);
    assert_eq!(orch.state(), TurnState::Idle);
}

#[tokio::test]
async fn synthesis_failure_ends_turn_without_playback() {
    let log = Arc::new(CallLog::default());
    let mut orch = build(
        Stages {
            log: Arc::clone(&log),
            transcript: Ok("is it done yet?".to_string()),
            reply: Ok(Some("Give it two more minutes.".to_string())),
            synthesis: Err(Error::Synthesis("voice service down".to_string())),
        },
        true,
    );
    let chef = &builtin_personas()[0];

    orch.press().unwrap();
    let result = orch.release(chef, &recipe_ctx()).await;

    assert!(result.is_err());
    assert_eq!(log.synthesize.load(Ordering::SeqCst), 1);
    assert_eq!(log.play.load(Ordering::SeqCst), 0);
    assert_eq!(orch.state(), TurnState::Idle);
}

#[tokio::test]
async fn orchestrator_recovers_after_a_failed_turn() {
    let log = Arc::new(CallLog::default());
    let mut failing = build(
        Stages {
            log: Arc::clone(&log),
            transcript: Err(Error::Transcription("blip".to_string())),
            reply: Ok(None),
            synthesis: Ok(PathBuf::from("/tmp/tts.mp3")),
        },
        true,
    );
    let chef = &builtin_personas()[0];
    let ctx = recipe_ctx();

    failing.press().unwrap();
    assert!(failing.release(chef, &ctx).await.is_err());

    // A fresh press is accepted immediately after the failure
    assert!(failing.press().unwrap());
    assert_eq!(failing.state(), TurnState::Recording);
}

#[tokio::test]
async fn rapid_release_without_recording_does_nothing() {
    let log = Arc::new(CallLog::default());
    let mut orch = build(happy_stages(&log), false);
    let chef = &builtin_personas()[0];

    // Release with no press at all
    let outcome = orch.release(chef, &recipe_ctx()).await.unwrap();
    assert_eq!(outcome, TurnOutcome::NoClip);
    assert_eq!(log.transcribe.load(Ordering::SeqCst), 0);
}

fn recipe_ctx() -> souschef::RecipeContext {
    souschef::RecipeContext {
        title: "Shakshuka".to_string(),
        description: "Eggs poached in spiced tomato sauce".to_string(),
        steps: vec![
            "Soften the onions and peppers.".to_string(),
            "Add tomatoes and simmer.".to_string(),
            "Crack in the eggs and cover.".to_string(),
        ],
        step_index: 1,
    }
}
