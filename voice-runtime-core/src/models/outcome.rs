use serde::{Deserialize, Serialize};

/// Why an Ask call ended without an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbandonReason {
    UserExit,
    ExhaustedRetries,
    DeviceUnavailable,
}

/// Terminal result of one `RetryEngine::ask` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryOutcome<T> {
    Accepted(T),
    /// All attempts were used and the user asked to keep going; the caller
    /// decides what continuing means.
    Escalated { attempts_used: u32 },
    Abandoned(AbandonReason),
}

impl<T> RetryOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            _ => None,
        }
    }

    pub fn abandon_reason(&self) -> Option<AbandonReason> {
        match self {
            Self::Abandoned(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// The user's answer to a frustration deviation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviationDecision {
    Continue,
    Stop,
}

/// Result of evaluating a spoken word against the expected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceEvaluation {
    pub correct: bool,
    /// What was heard, if anything.
    pub transcript: Option<String>,
    pub feedback: String,
}
