use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::models::config::SynthesizerPolicy;
use crate::models::engine_status::{EngineStatus, EngineUsed, SpeechOptions};
use crate::models::error::VoiceError;
use crate::runtime::watchdog::{bounded, bounded_try};
use crate::traits::speech_engine::SpeechEngine;
use crate::traits::voice_delegate::VoiceDelegate;

/// Last-resort engine: prints the text. Always available.
#[derive(Debug, Default, Clone)]
pub struct ConsoleEngine;

#[async_trait]
impl SpeechEngine for ConsoleEngine {
    fn name(&self) -> &str {
        "console"
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, _options: &SpeechOptions) -> Result<(), VoiceError> {
        println!("🔊 {}", text);
        Ok(())
    }
}

/// Ordered engine chain plus the cached result of probing each engine.
pub struct EngineRegistry {
    engines: Vec<Arc<dyn SpeechEngine>>,
    statuses: Mutex<Vec<EngineStatus>>,
    policy: SynthesizerPolicy,
}

impl EngineRegistry {
    /// Probe every engine once, in order, each probe bounded by
    /// `policy.probe_timeout`.
    pub async fn probe(engines: Vec<Arc<dyn SpeechEngine>>, policy: SynthesizerPolicy) -> Self {
        let statuses = probe_all(&engines, &policy).await;
        let registry = Self {
            engines,
            statuses: Mutex::new(statuses),
            policy,
        };
        log::info!("Speech engines: {}", registry.summary());
        registry
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn statuses(&self) -> Vec<EngineStatus> {
        self.statuses.lock().clone()
    }

    pub fn is_available(&self, index: usize) -> bool {
        self.statuses
            .lock()
            .get(index)
            .map(|s| s.available)
            .unwrap_or(false)
    }

    /// One-line status report, e.g. `elevenlabs: unavailable (probe failed), espeak: ok`.
    pub fn summary(&self) -> String {
        self.statuses
            .lock()
            .iter()
            .map(|s| match (s.available, &s.last_failure_reason) {
                (true, _) => format!("{}: ok", s.name),
                (false, Some(reason)) => format!("{}: unavailable ({})", s.name, reason),
                (false, None) => format!("{}: unavailable", s.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Probe all engines again, replacing every cached status.
    pub async fn reprobe(&self) {
        let statuses = probe_all(&self.engines, &self.policy).await;
        *self.statuses.lock() = statuses;
        log::info!("Speech engines re-probed: {}", self.summary());
    }

    fn record_success(&self, index: usize) {
        let mut statuses = self.statuses.lock();
        if let Some(status) = statuses.get_mut(index).filter(|s| s.consecutive_failures > 0) {
            log::debug!("Speech engine {} recovered", status.name);
            status.consecutive_failures = 0;
        }
    }

    fn record_failure(&self, index: usize, reason: &VoiceError) {
        let mut statuses = self.statuses.lock();
        let Some(status) = statuses.get_mut(index) else {
            return;
        };
        status.consecutive_failures += 1;
        status.last_failure_reason = Some(reason.to_string());
        let limit = self.policy.failure_limit;
        if limit > 0 && status.consecutive_failures >= limit && status.available {
            status.available = false;
            log::warn!(
                "Speech engine {} disabled after {} consecutive failures",
                status.name,
                status.consecutive_failures
            );
        }
    }
}

async fn probe_all(engines: &[Arc<dyn SpeechEngine>], policy: &SynthesizerPolicy) -> Vec<EngineStatus> {
    let mut statuses = Vec::with_capacity(engines.len());
    for engine in engines {
        let probing = Arc::clone(engine);
        let available = match bounded("engine probe", policy.probe_timeout, async move { probing.probe().await }).await {
            Ok(available) => available,
            Err(e) => {
                log::warn!("Probe of {} failed: {}", engine.name(), e);
                false
            }
        };
        statuses.push(EngineStatus::probed(engine.name(), available));
    }
    statuses
}

/// Speaks text through the first engine in the chain that succeeds.
pub struct Synthesizer {
    registry: EngineRegistry,
    delegate: Option<Arc<dyn VoiceDelegate>>,
}

impl Synthesizer {
    pub async fn initialize(engines: Vec<Arc<dyn SpeechEngine>>, policy: SynthesizerPolicy) -> Self {
        Self {
            registry: EngineRegistry::probe(engines, policy).await,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn VoiceDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn statuses(&self) -> Vec<EngineStatus> {
        self.registry.statuses()
    }

    pub async fn reprobe(&self) {
        self.registry.reprobe().await;
    }

    /// Speak `text`, falling through the chain on failure.
    ///
    /// The text is logged before any engine is tried. Engines after the first
    /// successful one are never called.
    pub async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<EngineUsed, VoiceError> {
        log::info!("Speaking: {}", text);
        if let Some(ref delegate) = self.delegate {
            delegate.on_synthesis_started(text);
        }

        let mut used = None;
        for (index, engine) in self.registry.engines.iter().enumerate() {
            if !self.registry.is_available(index) {
                continue;
            }

            let calling = Arc::clone(engine);
            let owned_text = text.to_string();
            let owned_options = options.clone();
            let call = async move { calling.speak(&owned_text, &owned_options).await };

            match bounded_try("speech engine", self.registry.policy.engine_timeout, call).await {
                Ok(()) => {
                    self.registry.record_success(index);
                    used = Some(EngineUsed {
                        index,
                        name: engine.name().to_string(),
                    });
                    break;
                }
                Err(e) => {
                    if e == VoiceError::TimedOut {
                        engine.stop();
                    }
                    log::warn!("Speech engine {} failed: {}", engine.name(), e);
                    self.registry.record_failure(index, &e);
                }
            }
        }

        if let Some(ref delegate) = self.delegate {
            delegate.on_synthesis_ended(used.as_ref());
        }
        match used {
            Some(engine) => {
                log::debug!("Spoke with {}", engine.name);
                Ok(engine)
            }
            None => {
                log::error!("No speech engine could speak: {}", text);
                Err(VoiceError::AllEnginesFailed)
            }
        }
    }

    /// Interrupt any playback in progress.
    pub fn stop(&self) {
        for engine in &self.registry.engines {
            engine.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    struct FakeEngine {
        name: &'static str,
        available: AtomicBool,
        fails: AtomicBool,
        hangs: bool,
        calls: AtomicU32,
        stops: AtomicU32,
    }

    impl FakeEngine {
        fn new(name: &'static str, available: bool, fails: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                available: AtomicBool::new(available),
                fails: AtomicBool::new(fails),
                hangs: false,
                calls: AtomicU32::new(0),
                stops: AtomicU32::new(0),
            })
        }

        fn hanging(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                available: AtomicBool::new(true),
                fails: AtomicBool::new(false),
                hangs: true,
                calls: AtomicU32::new(0),
                stops: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechEngine for FakeEngine {
        fn name(&self) -> &str {
            self.name
        }

        async fn probe(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        async fn speak(&self, _text: &str, _options: &SpeechOptions) -> Result<(), VoiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hangs {
                return std::future::pending().await;
            }
            if self.fails.load(Ordering::SeqCst) {
                Err(VoiceError::ServiceUnavailable("quota".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn chain(engines: &[&Arc<FakeEngine>]) -> Vec<Arc<dyn SpeechEngine>> {
        engines
            .iter()
            .map(|e| Arc::clone(e) as Arc<dyn SpeechEngine>)
            .collect()
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let first = FakeEngine::new("premium", true, true);
        let second = FakeEngine::new("offline", true, false);
        let third = FakeEngine::new("fallback", true, false);
        let synth = Synthesizer::initialize(chain(&[&first, &second, &third]), SynthesizerPolicy::default()).await;

        let used = synth.speak("hola", &SpeechOptions::default()).await.unwrap();
        assert_eq!(used, EngineUsed { index: 1, name: "offline".into() });
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn unavailable_engines_are_skipped() {
        let first = FakeEngine::new("premium", false, false);
        let second = FakeEngine::new("offline", true, false);
        let synth = Synthesizer::initialize(chain(&[&first, &second]), SynthesizerPolicy::default()).await;

        let used = synth.speak("hola", &SpeechOptions::default()).await.unwrap();
        assert_eq!(used.index, 1);
        assert_eq!(first.calls(), 0);
        assert!(synth.registry().summary().starts_with("premium: unavailable (probe failed)"));
    }

    #[tokio::test]
    async fn all_failing_is_reported() {
        let first = FakeEngine::new("premium", true, true);
        let second = FakeEngine::new("offline", false, false);
        let synth = Synthesizer::initialize(chain(&[&first, &second]), SynthesizerPolicy::default()).await;

        let result = synth.speak("hola", &SpeechOptions::default()).await;
        assert_eq!(result, Err(VoiceError::AllEnginesFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_engine_falls_through() {
        let first = FakeEngine::hanging("premium");
        let second = FakeEngine::new("offline", true, false);
        let policy = SynthesizerPolicy {
            engine_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let synth = Synthesizer::initialize(chain(&[&first, &second]), policy).await;

        let used = synth.speak("hola", &SpeechOptions::default()).await.unwrap();
        assert_eq!(used.index, 1);
        assert_eq!(first.stops.load(Ordering::SeqCst), 1);
        assert_eq!(
            synth.statuses()[0].last_failure_reason.as_deref(),
            Some("timed out")
        );
    }

    #[tokio::test]
    async fn repeated_failures_disable_engine_until_reprobe() {
        let flaky = FakeEngine::new("premium", true, true);
        let backup = FakeEngine::new("offline", true, false);
        let synth = Synthesizer::initialize(chain(&[&flaky, &backup]), SynthesizerPolicy::default()).await;

        let mut seen = Vec::new();
        for _ in 0..5 {
            synth.speak("hola", &SpeechOptions::default()).await.unwrap();
            seen.push(synth.statuses()[0].available);
        }
        assert_eq!(flaky.calls(), 3);
        // Once unavailable, it stays unavailable.
        assert_eq!(seen, vec![true, true, false, false, false]);

        flaky.fails.store(false, Ordering::SeqCst);
        synth.reprobe().await;
        let used = synth.speak("hola", &SpeechOptions::default()).await.unwrap();
        assert_eq!(used.index, 0);
        assert_eq!(synth.statuses()[0].consecutive_failures, 0);
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let flaky = FakeEngine::new("premium", true, false);
        let backup = FakeEngine::new("offline", true, false);
        let synth = Synthesizer::initialize(chain(&[&flaky, &backup]), SynthesizerPolicy::default()).await;

        let before = synth.statuses();
        synth.speak("cero", &SpeechOptions::default()).await.unwrap();
        assert_eq!(synth.statuses(), before);

        flaky.fails.store(true, Ordering::SeqCst);

        synth.speak("uno", &SpeechOptions::default()).await.unwrap();
        synth.speak("dos", &SpeechOptions::default()).await.unwrap();
        assert_eq!(synth.statuses()[0].consecutive_failures, 2);
        flaky.fails.store(false, Ordering::SeqCst);
        synth.speak("tres", &SpeechOptions::default()).await.unwrap();

        let status = &synth.statuses()[0];
        assert!(status.available);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn console_engine_always_speaks() {
        let synth = Synthesizer::initialize(vec![Arc::new(ConsoleEngine)], SynthesizerPolicy::default()).await;
        let used = synth.speak("¿Cómo estás?", &SpeechOptions::default()).await.unwrap();
        assert_eq!(used.name, "console");
    }

    #[tokio::test]
    async fn stop_reaches_every_engine() {
        let first = FakeEngine::new("premium", true, false);
        let second = FakeEngine::new("offline", false, false);
        let synth = Synthesizer::initialize(chain(&[&first, &second]), SynthesizerPolicy::default()).await;
        synth.stop();
        assert_eq!(first.stops.load(Ordering::SeqCst), 1);
        assert_eq!(second.stops.load(Ordering::SeqCst), 1);
    }
}
