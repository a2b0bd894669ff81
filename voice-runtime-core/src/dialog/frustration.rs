use std::collections::HashMap;

use parking_lot::Mutex;

use crate::dialog::retry::{Question, RetryEngine};
use crate::models::capture::CorrelationTags;
use crate::models::config::FrustrationPolicy;
use crate::models::error::VoiceError;
use crate::models::outcome::{AbandonReason, DeviationDecision, RetryOutcome};
use crate::processing::ring_buffer::RingBuffer;

/// Pass/fail record of one session's exercises.
#[derive(Debug, Clone)]
pub struct DialogHistory {
    recent: RingBuffer<bool>,
    total: u32,
    passed: u32,
}

impl DialogHistory {
    pub fn new(window: usize) -> Self {
        Self {
            recent: RingBuffer::new(window),
            total: 0,
            passed: 0,
        }
    }

    pub fn record(&mut self, passed: bool) {
        self.recent.push(passed);
        self.total += 1;
        if passed {
            self.passed += 1;
        }
    }

    /// Window full and every entry a failure.
    pub fn is_frustrated(&self) -> bool {
        self.recent.is_full() && self.recent.iter().all(|passed| !passed)
    }

    /// Forget the trailing window. Totals are kept.
    pub fn clear_window(&mut self) {
        self.recent.reset();
    }

    pub fn recent(&self) -> Vec<bool> {
        self.recent.iter().collect()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn success_rate(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f32 / self.total as f32
    }
}

/// Watches exercise results per session and offers a break after a run of
/// failures.
pub struct FrustrationMonitor {
    policy: FrustrationPolicy,
    sessions: Mutex<HashMap<String, DialogHistory>>,
}

impl FrustrationMonitor {
    pub fn new(policy: FrustrationPolicy) -> Self {
        Self {
            policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Record one exercise result. Returns `true` when a deviation is due.
    pub fn record(&self, session: &str, passed: bool) -> bool {
        let mut sessions = self.sessions.lock();
        let history = sessions
            .entry(session.to_string())
            .or_insert_with(|| DialogHistory::new(self.policy.window));
        history.record(passed);
        let frustrated = history.is_frustrated();
        if frustrated {
            log::info!(
                "Session {}: {} failures in a row",
                session,
                self.policy.window
            );
        }
        frustrated
    }

    pub fn history(&self, session: &str) -> Option<DialogHistory> {
        self.sessions.lock().get(session).cloned()
    }

    pub fn end_session(&self, session: &str) {
        self.sessions.lock().remove(session);
    }

    /// Offer a break: supportive message, then "continue or rest?".
    ///
    /// A "no" or an exit phrase stops; anything else continues with a word of
    /// encouragement. The window is cleared either way.
    pub async fn intervene(
        &self,
        session: &str,
        engine: &RetryEngine,
        tags: &CorrelationTags,
    ) -> Result<DeviationDecision, VoiceError> {
        if let Some(history) = self.sessions.lock().get_mut(session) {
            history.clear_window();
        }

        engine.say(&self.policy.supportive_message).await;
        let question = Question::new(self.policy.continue_question.clone(), tags.clone()).with_max_attempts(2);
        let outcome = engine.ask_yes_no(&question).await?;

        let decision = match outcome {
            RetryOutcome::Accepted(false) | RetryOutcome::Abandoned(AbandonReason::UserExit) => DeviationDecision::Stop,
            _ => DeviationDecision::Continue,
        };
        if decision == DeviationDecision::Continue {
            if let Some(ref encouragement) = self.policy.encouragement {
                engine.say(encouragement).await;
            }
        }
        log::info!("Session {}: deviation answered with {:?}", session, decision);
        Ok(decision)
    }

    /// `record`, then `intervene` if a deviation is due.
    pub async fn observe(
        &self,
        session: &str,
        passed: bool,
        engine: &RetryEngine,
        tags: &CorrelationTags,
    ) -> Result<Option<DeviationDecision>, VoiceError> {
        if !self.record(session, passed) {
            return Ok(None);
        }
        self.intervene(session, engine, tags).await.map(Some)
    }
}

impl Default for FrustrationMonitor {
    fn default() -> Self {
        Self::new(FrustrationPolicy::default())
    }
}
