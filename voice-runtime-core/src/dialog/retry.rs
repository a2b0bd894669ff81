use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::dialog::interpreters::{KeywordExitDetector, KeywordYesNo};
use crate::models::audio_models::AudioFormat;
use crate::models::capture::{CaptureRequest, CaptureResult, CorrelationTags};
use crate::models::config::{ConfidencePolicy, RetryPolicy, VoiceRuntimeConfig};
use crate::models::engine_status::SpeechOptions;
use crate::models::error::VoiceError;
use crate::models::outcome::{AbandonReason, RetryOutcome, UtteranceEvaluation};
use crate::models::state::AskState;
use crate::runtime::synthesizer::Synthesizer;
use crate::session::capture::CaptureSession;
use crate::traits::interpreter::{ExitIntent, Validator, WordMatcher};
use crate::traits::voice_delegate::VoiceDelegate;

const DEFAULT_ESCALATIONS: [&str; 3] = [
    "No te escuché bien. ¿Puedes repetir?",
    "Hmm, no entendí. Intenta de nuevo, con calma.",
    "Está bien, una vez más. Habla claro, sin prisa.",
];

const CONFIRM_ESCALATIONS: [&str; 3] = [
    "Responde sí o no, por favor.",
    "Dime solo sí o no.",
    "¿Es sí o es no?",
];

/// A question asked with bounded retries.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    /// Spoken instead of the prompt on later attempts, one per attempt.
    /// The last one repeats once the list runs out.
    pub escalations: Vec<String>,
    /// Whether farewell phrases end the question with `UserExit`.
    pub permit_exit: bool,
    /// Overrides `RetryPolicy::max_attempts`.
    pub max_attempts: Option<u32>,
    pub tags: CorrelationTags,
}

impl Question {
    pub fn new(prompt: impl Into<String>, tags: CorrelationTags) -> Self {
        Self {
            prompt: prompt.into(),
            escalations: DEFAULT_ESCALATIONS.iter().map(|s| s.to_string()).collect(),
            permit_exit: true,
            max_attempts: None,
            tags,
        }
    }

    pub fn with_escalations<I, S>(mut self, escalations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.escalations = escalations.into_iter().map(Into::into).collect();
        self
    }

    pub fn permit_exit(mut self, permit: bool) -> Self {
        self.permit_exit = permit;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Text spoken on `attempt` (0-based).
    pub fn prompt_for(&self, attempt: u32) -> &str {
        if attempt == 0 || self.escalations.is_empty() {
            return &self.prompt;
        }
        let index = (attempt as usize - 1).min(self.escalations.len() - 1);
        &self.escalations[index]
    }
}

/// Drives question / capture / validate cycles until an answer is accepted,
/// the user opts out, or attempts run out.
pub struct RetryEngine {
    synthesizer: Arc<Synthesizer>,
    capture: Arc<CaptureSession>,
    policy: RetryPolicy,
    confidence: ConfidencePolicy,
    speech: SpeechOptions,
    recording_duration: Duration,
    format: AudioFormat,
    audio_root: PathBuf,
    exit_intent: Arc<dyn ExitIntent>,
    yes_no: Arc<dyn Validator<bool>>,
    delegate: Option<Arc<dyn VoiceDelegate>>,
}

impl RetryEngine {
    pub fn new(synthesizer: Arc<Synthesizer>, capture: Arc<CaptureSession>, config: &VoiceRuntimeConfig) -> Self {
        Self {
            synthesizer,
            capture,
            policy: config.retry.clone(),
            confidence: config.confidence.clone(),
            speech: SpeechOptions::new(config.language.clone()).with_rate(config.synthesizer.default_rate),
            recording_duration: config.recording_duration,
            format: config.recording,
            audio_root: config.audio_root.clone(),
            exit_intent: Arc::new(KeywordExitDetector::new()),
            yes_no: Arc::new(KeywordYesNo::new()),
            delegate: None,
        }
    }

    pub fn with_exit_intent(mut self, exit_intent: Arc<dyn ExitIntent>) -> Self {
        self.exit_intent = exit_intent;
        self
    }

    pub fn with_yes_no(mut self, yes_no: Arc<dyn Validator<bool>>) -> Self {
        self.yes_no = yes_no;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn VoiceDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn synthesizer(&self) -> &Arc<Synthesizer> {
        &self.synthesizer
    }

    /// Speak `text`. Synthesis failures are logged, never returned: the text
    /// has already been logged by the synthesizer.
    pub async fn say(&self, text: &str) {
        if let Err(e) = self.synthesizer.speak(text, &self.speech).await {
            log::warn!("Could not speak \"{}\": {}", text, e);
        }
    }

    /// Ask `question` until `validator` accepts an answer.
    ///
    /// Only storage failures are returned as `Err`; every other failure is
    /// folded into the outcome.
    pub async fn ask<T: Send>(
        &self,
        question: &Question,
        validator: &dyn Validator<T>,
    ) -> Result<RetryOutcome<T>, VoiceError> {
        let max_attempts = question.max_attempts.unwrap_or(self.policy.max_attempts).max(1);
        let mut busy_attempts = 0;
        let mut state = AskState::Init;

        loop {
            log::debug!("Ask \"{}\": {}", question.prompt, state.name());
            state = match state {
                AskState::Init => AskState::SpeakPrompt { attempt: 0 },

                AskState::SpeakPrompt { attempt } => {
                    if attempt > 0 {
                        tokio::time::sleep(self.policy.pause_between_attempts).await;
                    }
                    self.say(question.prompt_for(attempt)).await;
                    AskState::Capture { attempt }
                }

                AskState::Capture { attempt } => {
                    let capture = self.listen_once(&question.tags, attempt + 1, max_attempts).await?;
                    AskState::Evaluate {
                        attempt,
                        capture: Box::new(capture),
                    }
                }

                AskState::Evaluate { attempt, capture } => {
                    let attempts_used = attempt + 1;
                    let last = attempts_used >= max_attempts;

                    match capture.transcript() {
                        None => {
                            log::info!("Attempt {}/{}: nothing heard", attempts_used, max_attempts);
                            if capture.device_was_unavailable() {
                                busy_attempts += 1;
                            }
                            if !last {
                                AskState::SpeakPrompt { attempt: attempt + 1 }
                            } else if busy_attempts == max_attempts {
                                AskState::Done(RetryOutcome::Abandoned(AbandonReason::DeviceUnavailable))
                            } else if question.permit_exit {
                                AskState::EscalateExitCheck { attempts_used }
                            } else {
                                AskState::Done(RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries))
                            }
                        }
                        Some(text) if question.permit_exit && self.exit_intent.is_exit_intent(text) => {
                            log::info!("Exit intent detected: \"{}\"", text);
                            self.acknowledge_exit().await;
                            AskState::Done(RetryOutcome::Abandoned(AbandonReason::UserExit))
                        }
                        Some(text) => match self.validate(validator, text).await {
                            Some(value) => {
                                log::info!("Attempt {}/{}: accepted \"{}\"", attempts_used, max_attempts, text);
                                AskState::Done(RetryOutcome::Accepted(value))
                            }
                            None if !last => {
                                log::info!("Attempt {}/{}: invalid \"{}\"", attempts_used, max_attempts, text);
                                AskState::SpeakPrompt { attempt: attempt + 1 }
                            }
                            None => {
                                log::info!("Attempts exhausted on \"{}\"", question.prompt);
                                if let Some(ref message) = self.policy.exhausted_message {
                                    self.say(message).await;
                                }
                                AskState::Done(RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries))
                            }
                        },
                    }
                }

                AskState::EscalateExitCheck { attempts_used } => {
                    self.say(&self.policy.exit_check_prompt).await;
                    let capture = self
                        .listen_once(&question.tags, attempts_used + 1, max_attempts)
                        .await?;
                    AskState::Done(self.exit_check_outcome(&capture, attempts_used).await)
                }

                AskState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn exit_check_outcome<T>(&self, capture: &CaptureResult, attempts_used: u32) -> RetryOutcome<T> {
        let Some(text) = capture.transcript() else {
            return RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries);
        };
        if self.exit_intent.is_exit_intent(text) {
            self.acknowledge_exit().await;
            return RetryOutcome::Abandoned(AbandonReason::UserExit);
        }
        match self.validate(self.yes_no.as_ref(), text).await {
            Some(true) => RetryOutcome::Escalated { attempts_used },
            Some(false) => {
                self.acknowledge_exit().await;
                RetryOutcome::Abandoned(AbandonReason::UserExit)
            }
            None => RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries),
        }
    }

    async fn acknowledge_exit(&self) {
        if let Some(ref message) = self.policy.exit_acknowledgement {
            self.say(message).await;
        }
    }

    async fn validate<T>(&self, validator: &dyn Validator<T>, text: &str) -> Option<T> {
        match self.policy.validation_timeout {
            Some(limit) => match tokio::time::timeout(limit, validator.validate(text)).await {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("Validator gave no answer within {:?}", limit);
                    None
                }
            },
            None => validator.validate(text).await,
        }
    }

    async fn listen_once(
        &self,
        tags: &CorrelationTags,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<CaptureResult, VoiceError> {
        if let Some(ref delegate) = self.delegate {
            delegate.on_listening(attempt, max_attempts);
        }
        let request = CaptureRequest::new(self.recording_duration, self.audio_root.clone(), tags.clone())
            .with_format(self.format);
        self.capture.record_and_recognize(&request).await
    }

    /// Capture until something is heard, prompting the user to speak up
    /// between silent attempts. Nothing is spoken before the first capture.
    pub async fn listen(&self, tags: &CorrelationTags) -> Result<Option<String>, VoiceError> {
        self.listen_up_to(tags, self.policy.max_attempts.max(1)).await
    }

    async fn listen_up_to(&self, tags: &CorrelationTags, max_attempts: u32) -> Result<Option<String>, VoiceError> {
        for attempt in 0..max_attempts {
            let capture = self.listen_once(tags, attempt + 1, max_attempts).await?;
            if let Some(text) = capture.transcript() {
                return Ok(Some(text.to_string()));
            }
            log::info!("Listen attempt {}/{}: silence", attempt + 1, max_attempts);

            if attempt + 1 < max_attempts {
                if let Some(prompt) = self.listen_prompt(attempt) {
                    self.say(&prompt).await;
                }
                tokio::time::sleep(self.policy.pause_between_attempts).await;
            }
        }
        Ok(None)
    }

    fn listen_prompt(&self, attempt: u32) -> Option<String> {
        let prompts = &self.policy.listen_prompts;
        prompts.get((attempt as usize).min(prompts.len().saturating_sub(1))).cloned()
    }

    /// Ask a yes/no question. `true` only for an accepted "yes".
    pub async fn confirm(&self, prompt: &str, tags: &CorrelationTags) -> Result<bool, VoiceError> {
        let question = Question::new(prompt, tags.clone()).with_escalations(CONFIRM_ESCALATIONS);
        let outcome = self.ask(&question, self.yes_no.as_ref()).await?;
        Ok(matches!(outcome, RetryOutcome::Accepted(true)))
    }

    /// Like `ask`, with the engine's yes/no interpreter as the validator.
    pub async fn ask_yes_no(&self, question: &Question) -> Result<RetryOutcome<bool>, VoiceError> {
        self.ask(question, self.yes_no.as_ref()).await
    }

    /// Listen for `expected` and judge it with `matcher`.
    ///
    /// Confident verdicts are final. A low-confidence verdict earns another
    /// attempt; on the last attempt a near miss is given the benefit of the
    /// doubt.
    pub async fn evaluate_utterance(
        &self,
        expected: &str,
        matcher: &dyn WordMatcher,
        tags: &CorrelationTags,
    ) -> Result<UtteranceEvaluation, VoiceError> {
        let policy = &self.confidence;
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            let last = attempt + 1 >= max_attempts;

            let Some(spoken) = self.listen_up_to(tags, policy.listen_attempts.max(1)).await? else {
                if last {
                    return Ok(UtteranceEvaluation {
                        correct: false,
                        transcript: None,
                        feedback: policy.no_input_feedback.clone(),
                    });
                }
                self.say(&policy.silent_prompt).await;
                tokio::time::sleep(self.policy.pause_between_attempts).await;
                continue;
            };

            let verdict = matcher.compare(expected, &spoken).await;
            log::info!(
                "Evaluated \"{}\" against \"{}\": correct={}, confidence={:.2}",
                spoken,
                expected,
                verdict.correct,
                verdict.confidence
            );

            if verdict.confidence >= policy.accept_threshold {
                return Ok(UtteranceEvaluation {
                    correct: verdict.correct,
                    transcript: Some(spoken),
                    feedback: verdict.feedback,
                });
            }
            if !last {
                self.say(&policy.unclear_prompt).await;
                tokio::time::sleep(self.policy.pause_between_attempts).await;
                continue;
            }
            if verdict.confidence >= policy.lenient_threshold {
                return Ok(UtteranceEvaluation {
                    correct: true,
                    transcript: Some(spoken),
                    feedback: policy.lenient_feedback.clone(),
                });
            }
            return Ok(UtteranceEvaluation {
                correct: false,
                transcript: Some(spoken),
                feedback: verdict.feedback,
            });
        }

        Ok(UtteranceEvaluation {
            correct: false,
            transcript: None,
            feedback: policy.no_input_feedback.clone(),
        })
    }
}
