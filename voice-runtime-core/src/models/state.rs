use super::capture::CaptureResult;
use super::outcome::RetryOutcome;

/// Ask state machine.
///
/// State transitions:
/// ```text
/// init → speak_prompt → capture → evaluate → accepted
///             ↑                      ├→ retry ─┘
///             └──────────────────────├→ escalate_exit_check → abandoned / escalated
///                                    └→ abandoned
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AskState<T> {
    Init,
    SpeakPrompt { attempt: u32 },
    Capture { attempt: u32 },
    Evaluate { attempt: u32, capture: Box<CaptureResult> },
    EscalateExitCheck { attempts_used: u32 },
    Done(RetryOutcome<T>),
}

impl<T> AskState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SpeakPrompt { .. } => "speak_prompt",
            Self::Capture { .. } => "capture",
            Self::Evaluate { .. } => "evaluate",
            Self::EscalateExitCheck { .. } => "escalate_exit_check",
            Self::Done(_) => "done",
        }
    }
}
