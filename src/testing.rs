//! Test doubles for the recognition, synthesis and answering capabilities

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::query::{AnswerService, QueryError, QueryRequest};
use crate::recognition::{
    CycleId, RecognitionError, RecognitionEvent, RecognitionOutcome, Recognizer, Utterance,
};
use crate::speech::{SynthesisError, Synthesizer, Voice};

/// What the fake recognizer was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerCall {
    Start(CycleId),
    Stop,
}

struct RecognizerShared {
    calls: Mutex<Vec<(RecognizerCall, Instant)>>,
    refuse: Mutex<VecDeque<RecognitionError>>,
    active: watch::Sender<Option<CycleId>>,
    events: Option<mpsc::Sender<RecognitionEvent>>,
}

/// Recognizer double; clones share state so tests can drive it
#[derive(Clone)]
pub struct FakeRecognizer {
    shared: Arc<RecognizerShared>,
}

impl FakeRecognizer {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A fake that delivers events on `events`
    pub fn with_events(events: mpsc::Sender<RecognitionEvent>) -> Self {
        Self::build(Some(events))
    }

    fn build(events: Option<mpsc::Sender<RecognitionEvent>>) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            shared: Arc::new(RecognizerShared {
                calls: Mutex::new(Vec::new()),
                refuse: Mutex::new(VecDeque::new()),
                active,
                events,
            }),
        }
    }

    pub fn calls(&self) -> Vec<RecognizerCall> {
        self.shared.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timestamps(&self) -> Vec<Instant> {
        self.shared.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    /// Refuse upcoming starts, one queued error per start
    pub fn refuse_next_start(&self, error: RecognitionError) {
        self.shared.refuse.lock().unwrap().push_back(error);
    }

    /// Wait until cycle `cycle` (or a later one) is listening
    pub async fn wait_for_cycle(&self, cycle: CycleId) {
        let mut rx = self.shared.active.subscribe();
        rx.wait_for(|c| matches!(c, Some(live) if *live >= cycle))
            .await
            .expect("recognizer dropped");
    }

    /// Finish the live cycle with `outcome`, waiting for one to start first
    pub async fn finish(&self, outcome: RecognitionOutcome) -> CycleId {
        let mut rx = self.shared.active.subscribe();
        let live: Option<CycleId> = *rx.wait_for(|c| c.is_some()).await.expect("recognizer dropped");
        let cycle = live.expect("cycle is live");
        self.shared.active.send_replace(None);

        let events = self.shared.events.as_ref().expect("fake has no event channel");
        events
            .send(RecognitionEvent { cycle, outcome })
            .await
            .expect("machine stopped listening");
        cycle
    }

    pub async fn hear(&self, transcript: &str) -> CycleId {
        self.finish(RecognitionOutcome::Heard(Utterance::new(transcript))).await
    }

    pub async fn end(&self) -> CycleId {
        self.finish(RecognitionOutcome::Ended).await
    }

    pub async fn fail(&self, error: RecognitionError) -> CycleId {
        self.finish(RecognitionOutcome::Failed(error)).await
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn start(&mut self, cycle: CycleId) -> Result<(), RecognitionError> {
        self.shared
            .calls
            .lock()
            .unwrap()
            .push((RecognizerCall::Start(cycle), Instant::now()));

        let refusal = self.shared.refuse.lock().unwrap().pop_front();
        if let Some(error) = refusal {
            return Err(error);
        }
        self.shared.active.send_replace(Some(cycle));
        Ok(())
    }

    async fn stop(&mut self) {
        self.shared
            .calls
            .lock()
            .unwrap()
            .push((RecognizerCall::Stop, Instant::now()));
        self.shared.active.send_replace(None);
    }

    fn is_active(&self) -> bool {
        self.shared.active.borrow().is_some()
    }
}

/// What the fake synthesizer was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthCall {
    Speak(String),
    Cancel,
}

/// Synthesizer double with scripted failures
#[derive(Default)]
pub struct FakeSynthesizer {
    pub voices: Vec<Voice>,
    pub calls: Mutex<Vec<(SynthCall, Instant)>>,
    pub failures: Mutex<VecDeque<SynthesisError>>,
    /// How long each successful utterance takes
    pub duration: Duration,
}

impl FakeSynthesizer {
    pub fn failing_with(failures: Vec<SynthesisError>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SynthCall> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SynthCall::Speak(text) => Some(text),
                SynthCall::Cancel => None,
            })
            .collect()
    }

    pub fn timestamps(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn speak(&self, text: &str, _voice: Option<&Voice>) -> Result<(), SynthesisError> {
        self.calls
            .lock()
            .unwrap()
            .push((SynthCall::Speak(text.to_string()), Instant::now()));
        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }
        tokio::time::sleep(self.duration).await;
        Ok(())
    }

    async fn cancel(&self) {
        self.calls.lock().unwrap().push((SynthCall::Cancel, Instant::now()));
    }
}

/// Answering backend double
pub struct FakeAnswers {
    requests: Mutex<Vec<QueryRequest>>,
    /// Answer text, or the HTTP status to fail with
    reply: Result<String, u16>,
    delay: Duration,
}

impl FakeAnswers {
    pub fn replying(answer: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Ok(answer.to_string()),
            delay: Duration::from_millis(250),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Err(status),
            delay: Duration::from_millis(250),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerService for FakeAnswers {
    async fn ask(&self, request: &QueryRequest) -> Result<String, QueryError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.reply.clone().map_err(QueryError::Status)
    }
}
