use async_trait::async_trait;

/// Semantic validation of a transcript (yes/no, name, age, ...).
///
/// Returns `Some(value)` when the answer is valid. Plain closures
/// `Fn(&str) -> Option<T>` implement this trait.
#[async_trait]
pub trait Validator<T>: Send + Sync {
    async fn validate(&self, text: &str) -> Option<T>;
}

#[async_trait]
impl<T, F> Validator<T> for F
where
    T: Send + 'static,
    F: Fn(&str) -> Option<T> + Send + Sync,
{
    async fn validate(&self, text: &str) -> Option<T> {
        self(text)
    }
}

/// Detects that the speaker wants to leave the current activity.
pub trait ExitIntent: Send + Sync {
    fn is_exit_intent(&self, text: &str) -> bool;
}

impl<F> ExitIntent for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_exit_intent(&self, text: &str) -> bool {
        self(text)
    }
}

/// Verdict of comparing a spoken utterance against the expected word.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchVerdict {
    pub correct: bool,
    /// 0.0–1.0
    pub confidence: f32,
    pub feedback: String,
}

/// Compares what was said against what was expected.
#[async_trait]
pub trait WordMatcher: Send + Sync {
    async fn compare(&self, expected: &str, spoken: &str) -> MatchVerdict;
}
