//! Core interaction state machine
//!
//! Drives the listen, query, answer and speak cycle. Inputs arrive on three
//! channels (start commands, recognition events, completions of spawned
//! work) and are handled one at a time, so no two handlers ever overlap.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::events::InteractionEvent;
use crate::query::{AnswerService, QueryRequest, APOLOGY};
use crate::recognition::{
    ListenMode, RecognitionError, RecognitionEvent, RecognitionOutcome, RecognitionSession,
    Utterance, WakePhrase,
};
use crate::speech::{split_into_chunks, PlaybackReport, SpeechOutputPlayer};

use super::interaction::{InteractionState, StatusLine};

/// Document name used when the start trigger carries none
pub const DEFAULT_DOCUMENT: &str = "animal_story";

/// Refused recognizer starts tolerated before giving up on the microphone
const START_ATTEMPTS: u32 = 3;

/// Identifies the document every query is asked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(document: &str) -> Self {
        let document = document.trim();
        if document.is_empty() {
            Self(DEFAULT_DOCUMENT.to_string())
        } else {
            Self(document.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Requests from outside the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin the session, or recover from the Error state
    Start { document: String },
}

/// Results of work the machine spawned
#[derive(Debug)]
enum Completion {
    Answered(Result<String, String>),
    Spoken(PlaybackReport),
}

/// Tunables of the state machine
#[derive(Debug, Clone)]
pub struct MachineOptions {
    pub wake_phrase: WakePhrase,
    pub max_chunk_len: usize,
}

/// The state machine that owns the interaction state
pub struct InteractionStateMachine {
    /// Current state
    state: InteractionState,
    /// Time when the current state was entered
    state_entered_at: Instant,
    /// Set once by the first start trigger
    session: Option<SessionId>,
    options: MachineOptions,
    recognition: RecognitionSession,
    answers: Arc<dyn AnswerService>,
    player: SpeechOutputPlayer,
    /// Channel for emitting interaction events
    event_tx: broadcast::Sender<InteractionEvent>,
    /// Current state for the animator
    state_tx: watch::Sender<InteractionState>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: Option<mpsc::Receiver<Completion>>,
}

impl InteractionStateMachine {
    pub fn new(
        recognition: RecognitionSession,
        answers: Arc<dyn AnswerService>,
        player: SpeechOutputPlayer,
        options: MachineOptions,
        event_tx: broadcast::Sender<InteractionEvent>,
        state_tx: watch::Sender<InteractionState>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(8);
        let state = InteractionState::default();
        state_tx.send_replace(state);

        Self {
            state,
            state_entered_at: Instant::now(),
            session: None,
            options,
            recognition,
            answers,
            player,
            event_tx,
            state_tx,
            completion_tx,
            completion_rx: Some(completion_rx),
        }
    }

    /// Get the current state
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Run the state machine until its input channels close
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        mut recognition: mpsc::Receiver<RecognitionEvent>,
    ) {
        let Some(mut completions) = self.completion_rx.take() else {
            warn!("state machine is already running");
            return;
        };

        info!(state = %self.state, "state machine started");

        loop {
            tokio::select! {
                Some(command) = commands.recv() => self.handle_command(command).await,
                Some(event) = recognition.recv() => self.handle_recognition(event).await,
                Some(done) = completions.recv() => self.handle_completion(done).await,
                else => break,
            }
        }

        self.recognition.stop().await;
        info!("state machine stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { document } => self.start(&document).await,
        }
    }

    /// Start listening for the wake phrase
    async fn start(&mut self, document: &str) {
        if let Some(session) = &self.session {
            if self.state != InteractionState::Error {
                warn!(document = %session, state = %self.state, "start ignored, session already running");
                return;
            }
            info!(document = %session, "recovering from error");
        } else {
            let session = SessionId::new(document);
            info!(document = %session, "session started");
            self.emit(InteractionEvent::SessionStarted {
                document: session.as_str().to_string(),
            });
            self.session = Some(session);
        }

        self.listen_for_activation().await;
    }

    async fn handle_recognition(&mut self, event: RecognitionEvent) {
        let Some((mode, outcome)) = self.recognition.accept(event) else {
            return;
        };

        match outcome {
            RecognitionOutcome::Heard(utterance) => {
                debug!(%mode, transcript = utterance.text(), "heard");
                self.on_heard(utterance).await;
            }
            RecognitionOutcome::Ended => {
                debug!(%mode, "listening ended without result");
                self.on_listen_ended().await;
            }
            RecognitionOutcome::Failed(e) if e.is_fatal() => self.fail(e).await,
            RecognitionOutcome::Failed(e) => {
                warn!(%mode, error = %e, "recognition error");
                self.on_listen_ended().await;
            }
        }
    }

    async fn on_heard(&mut self, utterance: Utterance) {
        match self.state {
            InteractionState::ActivationListening => {
                if self.options.wake_phrase.matches(&utterance) {
                    info!(transcript = utterance.text(), "wake phrase detected");
                    self.emit(InteractionEvent::WakePhraseDetected {
                        transcript: utterance.into_text(),
                    });
                    self.listen_for_query().await;
                } else {
                    self.listen_for_activation().await;
                }
            }
            InteractionState::QueryListening => self.submit_query(utterance).await,
            state => debug!(%state, "ignoring transcript"),
        }
    }

    async fn on_listen_ended(&mut self) {
        match self.state {
            InteractionState::QueryListening => {
                debug!("restarting query listening");
                self.listen(ListenMode::Query).await;
            }
            InteractionState::ActivationListening => self.listen_for_activation().await,
            _ => {}
        }
    }

    async fn listen_for_activation(&mut self) {
        self.transition_to(InteractionState::ActivationListening);
        self.publish_status(StatusLine::activation(self.options.wake_phrase.as_str()));
        self.listen(ListenMode::Activation).await;
    }

    async fn listen_for_query(&mut self) {
        self.transition_to(InteractionState::QueryListening);
        self.publish_status(StatusLine::query());
        self.listen(ListenMode::Query).await;
    }

    /// Start a listen cycle. A fatal refusal ends in the Error state; other
    /// refusals are retried after the settle delay, up to [`START_ATTEMPTS`].
    async fn listen(&mut self, mode: ListenMode) {
        let mut attempt = 1;
        loop {
            match self.recognition.start(mode).await {
                Ok(()) => return,
                Err(e) if e.is_fatal() || attempt >= START_ATTEMPTS => {
                    self.fail(e).await;
                    return;
                }
                Err(e) => {
                    debug!(%mode, attempt, error = %e, "retrying recognition start");
                    attempt += 1;
                }
            }
        }
    }

    /// Send the captured query; recognition stays off until the answer is spoken
    async fn submit_query(&mut self, utterance: Utterance) {
        self.transition_to(InteractionState::Processing);
        self.publish_status(StatusLine::processing());
        self.recognition.stop().await;

        let name = self
            .session
            .as_ref()
            .map(SessionId::as_str)
            .unwrap_or(DEFAULT_DOCUMENT)
            .to_string();
        let request = QueryRequest {
            name,
            query: utterance.into_text(),
        };

        info!(name = %request.name, query = %request.query, "sending query");
        self.emit(InteractionEvent::QuerySubmitted {
            query: request.query.clone(),
        });

        let answers = Arc::clone(&self.answers);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = answers.ask(&request).await.map_err(|e| e.to_string());
            let _ = completion_tx.send(Completion::Answered(outcome)).await;
        });
    }

    async fn handle_completion(&mut self, done: Completion) {
        match (self.state, done) {
            (InteractionState::Processing, Completion::Answered(Ok(answer))) => {
                info!(chars = answer.len(), "answer received");
                self.emit(InteractionEvent::AnswerReceived { chars: answer.len() });
                self.speak(answer);
            }
            (InteractionState::Processing, Completion::Answered(Err(reason))) => {
                warn!(%reason, "query failed, apologizing");
                self.emit(InteractionEvent::QueryFailed { reason });
                self.speak(APOLOGY.to_string());
            }
            (InteractionState::Speaking, Completion::Spoken(report)) => {
                info!(
                    spoken = report.spoken,
                    skipped = report.skipped,
                    abandoned = report.abandoned,
                    "finished speaking"
                );
                self.emit(InteractionEvent::SpeechFinished {
                    spoken: report.spoken,
                    skipped: report.skipped,
                    abandoned: report.abandoned,
                });
                self.listen_for_activation().await;
            }
            (state, done) => debug!(%state, ?done, "ignoring stale completion"),
        }
    }

    fn speak(&mut self, text: String) {
        self.transition_to(InteractionState::Speaking);
        self.publish_status(StatusLine::speaking());

        let chunks = split_into_chunks(&text, self.options.max_chunk_len);
        debug!(chunks = chunks.len(), "speaking response");
        self.emit(InteractionEvent::SpeechStarted { chunks: chunks.len() });

        let player = self.player.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let report = player.speak(&chunks).await;
            let _ = completion_tx.send(Completion::Spoken(report)).await;
        });
    }

    async fn fail(&mut self, e: RecognitionError) {
        error!(error = %e, "recognition unavailable");
        self.recognition.stop().await;
        self.transition_to(InteractionState::Error);
        self.publish_status(StatusLine::error(e.user_message()));
    }

    /// Perform a state transition
    fn transition_to(&mut self, new_state: InteractionState) {
        let old_state = self.state;
        if new_state == old_state {
            return;
        }

        let duration_ms = self.state_entered_at.elapsed().as_millis() as u64;
        info!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "state transition"
        );

        self.state = new_state;
        self.state_entered_at = Instant::now();
        self.state_tx.send_replace(new_state);

        self.emit(InteractionEvent::StateChanged {
            from: old_state,
            to: new_state,
            duration_ms,
        });
    }

    fn publish_status(&self, status: StatusLine) {
        debug!(text = %status.text, "status");
        self.emit(InteractionEvent::Status(status));
    }

    fn emit(&self, event: InteractionEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::task::JoinHandle;

    use crate::state::StatusClass;
    use crate::testing::{FakeAnswers, FakeRecognizer, FakeSynthesizer, RecognizerCall};

    const SETTLE: Duration = Duration::from_millis(100);
    const PATIENCE: Duration = Duration::from_secs(120);

    struct Harness {
        commands: mpsc::Sender<Command>,
        recognition_tx: mpsc::Sender<RecognitionEvent>,
        recognizer: FakeRecognizer,
        synth: Arc<FakeSynthesizer>,
        answers: Arc<FakeAnswers>,
        events: broadcast::Receiver<InteractionEvent>,
        seen: Vec<InteractionEvent>,
        state_rx: watch::Receiver<InteractionState>,
        task: JoinHandle<()>,
    }

    impl Harness {
        fn new(answers: FakeAnswers) -> Self {
            let (command_tx, command_rx) = mpsc::channel(4);
            let (recognition_tx, recognition_rx) = mpsc::channel(16);
            let (event_tx, events) = broadcast::channel(256);
            let (state_tx, state_rx) = watch::channel(InteractionState::default());

            let recognizer = FakeRecognizer::with_events(recognition_tx.clone());
            let synth = Arc::new(FakeSynthesizer {
                duration: Duration::from_millis(300),
                ..Default::default()
            });
            let answers = Arc::new(answers);

            let mut machine = InteractionStateMachine::new(
                RecognitionSession::new(Box::new(recognizer.clone()), SETTLE),
                answers.clone(),
                SpeechOutputPlayer::new(synth.clone(), Duration::from_millis(100), 5),
                MachineOptions {
                    wake_phrase: WakePhrase::new("fox"),
                    max_chunk_len: 200,
                },
                event_tx,
                state_tx,
            );

            let task = tokio::spawn(async move { machine.run(command_rx, recognition_rx).await });

            Self {
                commands: command_tx,
                recognition_tx,
                recognizer,
                synth,
                answers,
                events,
                seen: Vec::new(),
                state_rx,
                task,
            }
        }

        async fn start(&self, document: &str) {
            self.commands
                .send(Command::Start {
                    document: document.to_string(),
                })
                .await
                .unwrap();
        }

        async fn next_event(&mut self) -> InteractionEvent {
            let event = tokio::time::timeout(PATIENCE, self.events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            self.seen.push(event.clone());
            event
        }

        async fn wait_for_state(&mut self, target: InteractionState) {
            loop {
                if let InteractionEvent::StateChanged { to, .. } = self.next_event().await {
                    if to == target {
                        return;
                    }
                }
            }
        }

        async fn wait_for(&mut self, wanted: impl Fn(&InteractionEvent) -> bool) -> InteractionEvent {
            loop {
                let event = self.next_event().await;
                if wanted(&event) {
                    return event;
                }
            }
        }

        fn count(&self, wanted: impl Fn(&InteractionEvent) -> bool) -> usize {
            self.seen.iter().filter(|e| wanted(e)).count()
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            self.task.abort();
        }
    }

    #[test]
    fn test_session_id_default() {
        assert_eq!(SessionId::new("  ").as_str(), "animal_story");
        assert_eq!(SessionId::new(" demo ").as_str(), "demo");
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_is_spoken_then_back_to_activation() {
        let mut h = Harness::new(FakeAnswers::replying("It is sunny"));

        h.start("demo").await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;

        h.recognizer.hear("What is the weather").await;
        h.wait_for_state(InteractionState::Processing).await;
        h.wait_for_state(InteractionState::Speaking).await;
        assert_eq!(*h.state_rx.borrow(), InteractionState::Speaking);
        h.wait_for_state(InteractionState::ActivationListening).await;

        assert_eq!(
            h.answers.requests(),
            vec![QueryRequest {
                name: "demo".to_string(),
                query: "what is the weather".to_string(),
            }]
        );
        assert_eq!(h.synth.spoken(), vec!["It is sunny"]);
        assert_eq!(
            h.count(|e| matches!(e, InteractionEvent::SpeechStarted { .. })),
            1
        );

        // listening for the wake phrase again
        h.recognizer.wait_for_cycle(3).await;
        assert_eq!(*h.state_rx.borrow(), InteractionState::ActivationListening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_speaks_apology() {
        let mut h = Harness::new(FakeAnswers::failing(500));

        h.start("demo").await;
        h.recognizer.hear("hey fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        h.recognizer.hear("what is the weather").await;

        let failed = h
            .wait_for(|e| matches!(e, InteractionEvent::QueryFailed { .. }))
            .await;
        assert!(matches!(failed, InteractionEvent::QueryFailed { reason } if reason.contains("500")));

        h.wait_for_state(InteractionState::Speaking).await;
        h.wait_for_state(InteractionState::ActivationListening).await;
        assert_eq!(h.synth.spoken(), vec![APOLOGY]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_without_wake_phrase_keeps_waiting() {
        let mut h = Harness::new(FakeAnswers::replying("unused"));

        h.start("demo").await;
        h.recognizer.hear("find information today").await;
        h.recognizer.wait_for_cycle(2).await;

        h.recognizer.hear("please find fox information today").await;
        h.wait_for_state(InteractionState::QueryListening).await;

        assert_eq!(
            h.count(|e| matches!(e, InteractionEvent::WakePhraseDetected { .. })),
            1
        );
        assert!(h.answers.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_phrase_in_query_mode_is_the_query() {
        let mut h = Harness::new(FakeAnswers::replying("yes"));

        h.start("demo").await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        h.recognizer.hear("fox are you there").await;
        h.wait_for_state(InteractionState::Processing).await;

        assert_eq!(
            h.count(|e| matches!(e, InteractionEvent::WakePhraseDetected { .. })),
            1
        );
        h.wait_for_state(InteractionState::Speaking).await;
        assert_eq!(h.answers.requests()[0].query, "fox are you there");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout_restarts_query_listening() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));

        h.start("demo").await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;

        let ended = h.recognizer.end().await;
        h.recognizer.wait_for_cycle(ended + 1).await;
        assert_eq!(*h.state_rx.borrow(), InteractionState::QueryListening);

        h.recognizer.hear("tell me a story").await;
        h.wait_for_state(InteractionState::Processing).await;
        assert_eq!(h.answers.requests()[0].query, "tell me a story");
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_end_restarts_activation() {
        let h = Harness::new(FakeAnswers::replying("ok"));

        h.start("demo").await;
        let ended = h.recognizer.end().await;
        h.recognizer.wait_for_cycle(ended + 1).await;

        assert_eq!(*h.state_rx.borrow(), InteractionState::ActivationListening);
        assert_eq!(
            h.recognizer.calls(),
            vec![RecognizerCall::Start(1), RecognizerCall::Start(2)]
        );
        let times = h.recognizer.timestamps();
        assert!(times[1] - times[0] >= SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_utterance_ignored_while_processing() {
        let mut h = Harness::new(FakeAnswers::replying("one answer").with_delay(Duration::from_secs(5)));

        h.start("demo").await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        let query_cycle = h.recognizer.hear("first question").await;
        h.wait_for_state(InteractionState::Processing).await;

        h.recognition_tx
            .send(RecognitionEvent::heard(query_cycle, "second question"))
            .await
            .unwrap();

        h.wait_for_state(InteractionState::Speaking).await;
        h.wait_for_state(InteractionState::ActivationListening).await;
        assert_eq!(h.answers.requests().len(), 1);
        assert_eq!(h.synth.spoken(), vec!["one answer"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_enters_error_until_restarted() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));

        h.start("demo").await;
        h.recognizer.fail(RecognitionError::NotAllowed).await;
        h.wait_for_state(InteractionState::Error).await;

        let status = h
            .wait_for(|e| matches!(e, InteractionEvent::Status(_)))
            .await;
        let InteractionEvent::Status(status) = status else {
            unreachable!()
        };
        assert_eq!(status.class, StatusClass::Error);
        assert_eq!(status.text, "Please allow microphone access");
        assert_eq!(h.recognizer.calls(), vec![RecognizerCall::Start(1)]);

        // manual recovery keeps the original session
        h.start("other").await;
        h.wait_for_state(InteractionState::ActivationListening).await;
        h.recognizer.wait_for_cycle(2).await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        h.recognizer.hear("hello").await;
        h.wait_for_state(InteractionState::Processing).await;
        h.wait_for_state(InteractionState::Speaking).await;
        assert_eq!(h.answers.requests()[0].name, "demo");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_start_enters_error() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));
        h.recognizer.refuse_next_start(RecognitionError::NotAllowed);

        h.start("demo").await;
        h.wait_for_state(InteractionState::Error).await;

        let status = h
            .wait_for(|e| matches!(e, InteractionEvent::Status(s) if s.class == StatusClass::Error))
            .await;
        assert_eq!(
            status,
            InteractionEvent::Status(StatusLine::error("Please allow microphone access"))
        );
        assert_eq!(h.recognizer.calls(), vec![RecognizerCall::Start(1)]);
        assert_eq!(*h.state_rx.borrow(), InteractionState::Error);

        // the next start trigger gets a working microphone
        h.start("demo").await;
        h.wait_for_state(InteractionState::ActivationListening).await;
        h.recognizer.wait_for_cycle(2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_refusal_is_retried() {
        let h = Harness::new(FakeAnswers::replying("ok"));
        h.recognizer.refuse_next_start(RecognitionError::AlreadyStarted);

        h.start("demo").await;
        h.recognizer.wait_for_cycle(2).await;

        assert_eq!(*h.state_rx.borrow(), InteractionState::ActivationListening);
        assert_eq!(
            h.recognizer.calls(),
            vec![RecognizerCall::Start(1), RecognizerCall::Start(2)]
        );
        let times = h.recognizer.timestamps();
        assert!(times[1] - times[0] >= SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_refusals_give_up() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));
        for _ in 0..START_ATTEMPTS {
            h.recognizer.refuse_next_start(RecognitionError::AlreadyStarted);
        }

        h.start("demo").await;
        h.wait_for_state(InteractionState::Error).await;

        assert_eq!(h.recognizer.calls().len(), START_ATTEMPTS as usize);
        let status = h
            .wait_for(|e| matches!(e, InteractionEvent::Status(s) if s.class == StatusClass::Error))
            .await;
        assert_eq!(
            status,
            InteractionEvent::Status(StatusLine::error(
                "Error: Please check microphone permissions"
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_is_treated_as_end() {
        let h = Harness::new(FakeAnswers::replying("ok"));

        h.start("demo").await;
        let failed = h.recognizer.fail(RecognitionError::NoSpeech).await;
        h.recognizer.wait_for_cycle(failed + 1).await;
        assert_eq!(*h.state_rx.borrow(), InteractionState::ActivationListening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_ignored() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));

        h.start("demo").await;
        h.recognizer.wait_for_cycle(1).await;
        h.start("again").await;

        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        h.recognizer.wait_for_cycle(2).await;
        assert_eq!(
            h.count(|e| matches!(e, InteractionEvent::SessionStarted { .. })),
            1
        );
        assert_eq!(
            h.recognizer.calls(),
            vec![RecognizerCall::Start(1), RecognizerCall::Start(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_document_uses_default_session() {
        let mut h = Harness::new(FakeAnswers::replying("ok"));

        h.start("").await;
        let started = h
            .wait_for(|e| matches!(e, InteractionEvent::SessionStarted { .. }))
            .await;
        assert_eq!(
            started,
            InteractionEvent::SessionStarted {
                document: DEFAULT_DOCUMENT.to_string()
            }
        );
        h.recognizer.wait_for_cycle(1).await;
        assert_eq!(h.state_rx.borrow().accent(), crate::state::Accent::Red);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_lines_follow_the_cycle() {
        let mut h = Harness::new(FakeAnswers::replying("done"));

        h.start("demo").await;
        h.recognizer.hear("fox").await;
        h.wait_for_state(InteractionState::QueryListening).await;
        h.recognizer.hear("go").await;
        h.wait_for_state(InteractionState::Speaking).await;
        h.wait_for_state(InteractionState::ActivationListening).await;
        h.wait_for(|e| matches!(e, InteractionEvent::Status(_))).await;

        let texts: Vec<String> = h
            .seen
            .iter()
            .filter_map(|e| match e {
                InteractionEvent::Status(s) => Some(s.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "Say \"fox\" to activate",
                "Listening for your query...",
                "Processing...",
                "Speaking...",
                "Say \"fox\" to activate",
            ]
        );
    }
}
