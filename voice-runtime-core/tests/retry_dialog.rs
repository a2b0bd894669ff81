mod common;

use async_trait::async_trait;
use common::{harness, harness_with, tags, Reply};
use voice_runtime_core::{
    AbandonReason, DeviationDecision, MatchVerdict, Question, RetryOutcome, VoiceError, WordMatcher,
};

fn age(text: &str) -> Option<u32> {
    text.split_whitespace().find_map(|w| w.parse().ok())
}

fn question() -> Question {
    Question::new("¿Cuántos años tienes?", tags()).with_escalations(["Dime tu edad.", "Solo el número."])
}

#[tokio::test(start_paused = true)]
async fn silence_exhausts_after_exactly_max_attempts() {
    let h = harness(vec![]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question().permit_exit(false), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries));
    assert_eq!(h.captures(), 3);
    assert_eq!(
        h.spoken(),
        vec!["¿Cuántos años tienes?", "Dime tu edad.", "Solo el número."]
    );
}

#[tokio::test(start_paused = true)]
async fn farewell_on_first_attempt_exits_immediately() {
    let h = harness(vec![Reply::Text("adios")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::UserExit));
    assert_eq!(h.captures(), 1);
    assert_eq!(
        h.spoken(),
        vec!["¿Cuántos años tienes?", "Entiendo. Podemos parar cuando quieras."]
    );
}

#[tokio::test(start_paused = true)]
async fn farewell_is_just_text_when_exit_not_permitted() {
    let h = harness(vec![Reply::Text("adios"), Reply::Text("tengo 7")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question().permit_exit(false), &age).await.unwrap();
    assert_eq!(outcome, RetryOutcome::Accepted(7));
    assert_eq!(h.captures(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalid_then_valid_answer_is_accepted() {
    let h = harness(vec![Reply::Text("no sé"), Reply::Silence, Reply::Text("tengo 6 años")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Accepted(6));
    assert_eq!(h.captures(), 3);
    assert_eq!(
        h.spoken(),
        vec!["¿Cuántos años tienes?", "Dime tu edad.", "Solo el número."]
    );
}

#[tokio::test(start_paused = true)]
async fn escalation_prompts_never_exceed_attempts_and_clamp() {
    let h = harness_with(vec![], vec![], |config| config.retry.max_attempts = 5).await;
    let outcome = h.runtime.retry().ask::<u32>(&question().permit_exit(false), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries));
    assert_eq!(h.captures(), 5);
    assert_eq!(
        h.spoken(),
        vec![
            "¿Cuántos años tienes?",
            "Dime tu edad.",
            "Solo el número.",
            "Solo el número.",
            "Solo el número.",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn last_invalid_answer_speaks_exhausted_message() {
    let h = harness(vec![Reply::Text("azul"), Reply::Text("rojo"), Reply::Text("verde")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries));
    assert_eq!(h.spoken().last().map(String::as_str), Some("Descansemos un momento, está bien."));
}

#[tokio::test(start_paused = true)]
async fn silent_final_attempt_asks_to_continue() {
    let h = harness(vec![Reply::Silence, Reply::Silence, Reply::Silence, Reply::Text("sí")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();

    assert_eq!(outcome, RetryOutcome::Escalated { attempts_used: 3 });
    assert_eq!(h.captures(), 4);
    assert_eq!(
        h.spoken().last().map(String::as_str),
        Some("No logro escucharte. ¿Quieres intentar otra vez o mejor lo dejamos?")
    );
}

#[tokio::test(start_paused = true)]
async fn silent_final_attempt_declined_is_user_exit() {
    let h = harness(vec![Reply::Silence, Reply::Silence, Reply::Silence, Reply::Text("mejor no")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();
    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::UserExit));
}

#[tokio::test(start_paused = true)]
async fn silent_exit_check_exhausts() {
    let h = harness(vec![]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();
    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries));
    assert_eq!(h.captures(), 4);
}

#[tokio::test(start_paused = true)]
async fn busy_device_on_every_attempt_is_device_unavailable() {
    let h = harness(vec![Reply::Text("tengo 5")]).await;
    let _held = h.runtime.capture().arbiter().try_acquire().unwrap();

    let outcome = h.runtime.retry().ask::<u32>(&question(), &age).await.unwrap();
    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::DeviceUnavailable));
    assert_eq!(h.captures(), 0);
    assert_eq!(h.backend.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hung_validator_counts_as_invalid() {
    struct Stuck;

    #[async_trait]
    impl voice_runtime_core::Validator<u32> for Stuck {
        async fn validate(&self, _text: &str) -> Option<u32> {
            std::future::pending().await
        }
    }

    let h = harness(vec![Reply::Text("5"), Reply::Text("5"), Reply::Text("5")]).await;
    let outcome = h.runtime.retry().ask::<u32>(&question(), &Stuck).await.unwrap();
    assert_eq!(outcome, RetryOutcome::Abandoned(AbandonReason::ExhaustedRetries));
    assert_eq!(h.captures(), 3);
}

#[tokio::test(start_paused = true)]
async fn confirm_accepts_yes_only() {
    let h = harness(vec![Reply::Text("eh"), Reply::Text("sí, claro")]).await;
    assert!(h.runtime.retry().confirm("¿Quieres jugar?", &tags()).await.unwrap());
    assert_eq!(h.spoken(), vec!["¿Quieres jugar?", "Responde sí o no, por favor."]);

    let h = harness(vec![Reply::Text("no")]).await;
    assert!(!h.runtime.retry().confirm("¿Quieres jugar?", &tags()).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn listen_prompts_between_silent_attempts() {
    let h = harness(vec![Reply::Silence, Reply::Silence, Reply::Text("hola")]).await;
    let heard = h.runtime.retry().listen(&tags()).await.unwrap();

    assert_eq!(heard.as_deref(), Some("hola"));
    assert_eq!(
        h.spoken(),
        vec!["Te escucho, habla con claridad.", "No te escuché. Acércate más al micrófono."]
    );
}

#[tokio::test(start_paused = true)]
async fn listen_gives_up_after_max_attempts() {
    let h = harness(vec![]).await;
    assert_eq!(h.runtime.retry().listen(&tags()).await.unwrap(), None);
    assert_eq!(h.captures(), 3);
    assert_eq!(h.spoken().len(), 2);
}

struct FixedMatcher(f32, bool);

#[async_trait]
impl WordMatcher for FixedMatcher {
    async fn compare(&self, _expected: &str, _spoken: &str) -> MatchVerdict {
        MatchVerdict {
            correct: self.1,
            confidence: self.0,
            feedback: "¡Excelente!".into(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn confident_verdict_is_final() {
    let h = harness(vec![Reply::Text("pato")]).await;
    let evaluation = h
        .runtime
        .retry()
        .evaluate_utterance("pato", &FixedMatcher(0.9, true), &tags())
        .await
        .unwrap();
    assert!(evaluation.correct);
    assert_eq!(evaluation.transcript.as_deref(), Some("pato"));
    assert_eq!(evaluation.feedback, "¡Excelente!");
    assert_eq!(h.captures(), 1);
}

#[tokio::test(start_paused = true)]
async fn near_miss_on_last_attempt_gets_benefit_of_the_doubt() {
    let h = harness(vec![Reply::Text("bato"), Reply::Text("bato")]).await;
    let evaluation = h
        .runtime
        .retry()
        .evaluate_utterance("pato", &FixedMatcher(0.6, false), &tags())
        .await
        .unwrap();
    assert!(evaluation.correct);
    assert_eq!(evaluation.feedback, "¡Buen esfuerzo! Lo hiciste bien");
    assert_eq!(h.spoken(), vec!["Hmm, no estoy seguro. Intenta decirlo más claro."]);
}

#[tokio::test(start_paused = true)]
async fn low_confidence_on_last_attempt_is_incorrect() {
    let h = harness(vec![Reply::Text("gato"), Reply::Text("gato")]).await;
    let evaluation = h
        .runtime
        .retry()
        .evaluate_utterance("pato", &FixedMatcher(0.3, false), &tags())
        .await
        .unwrap();
    assert!(!evaluation.correct);
    assert_eq!(evaluation.transcript.as_deref(), Some("gato"));
}

#[tokio::test(start_paused = true)]
async fn nothing_heard_is_reported_without_transcript() {
    let h = harness(vec![]).await;
    let evaluation = h
        .runtime
        .retry()
        .evaluate_utterance("pato", &FixedMatcher(0.9, true), &tags())
        .await
        .unwrap();
    assert!(!evaluation.correct);
    assert!(evaluation.transcript.is_none());
    assert_eq!(evaluation.feedback, "No logré escucharte bien, pero está bien. Sigamos.");
    // Two evaluation attempts of two listen captures each.
    assert_eq!(h.captures(), 4);
}

#[tokio::test(start_paused = true)]
async fn three_failures_trigger_one_deviation() {
    let h = harness(vec![Reply::Text("no")]).await;
    let monitor = h.runtime.frustration();
    let retry = h.runtime.retry();

    let mut decisions = Vec::new();
    for passed in [false, false, false] {
        decisions.push(monitor.observe("sesion-1", passed, retry, &tags()).await.unwrap());
    }
    assert_eq!(decisions, vec![None, None, Some(DeviationDecision::Stop)]);
    assert_eq!(h.spoken()[0], "Descansemos un momento, está bien.");
    assert_eq!(h.spoken()[1], "¿Quieres seguir o prefieres descansar?");
}

#[tokio::test(start_paused = true)]
async fn a_pass_in_the_window_means_no_deviation() {
    let h = harness(vec![]).await;
    let monitor = h.runtime.frustration();
    for passed in [false, false, true] {
        let decision = monitor
            .observe("sesion-1", passed, h.runtime.retry(), &tags())
            .await
            .unwrap();
        assert_eq!(decision, None);
    }
    assert!(h.spoken().is_empty());
    assert_eq!(h.captures(), 0);
}

#[tokio::test(start_paused = true)]
async fn continuing_after_deviation_is_encouraged_and_window_resets() {
    let h = harness(vec![Reply::Text("sí")]).await;
    let monitor = h.runtime.frustration();
    for passed in [false, false] {
        monitor.record("s", passed);
    }
    let decision = monitor.observe("s", false, h.runtime.retry(), &tags()).await.unwrap();

    assert_eq!(decision, Some(DeviationDecision::Continue));
    assert_eq!(
        h.spoken().last().map(String::as_str),
        Some("¡Muy bien! Sigamos entonces. Tú puedes.")
    );
    assert!(!monitor.record("s", false));
}

#[tokio::test(start_paused = true)]
async fn storage_failure_propagates() {
    let h = harness_with(vec![Reply::Text("5")], vec![], |config| {
        // A file where the speaker directory should go.
        config.audio_root = config.audio_root.join("blocked");
        std::fs::write(&config.audio_root, b"x").unwrap();
    })
    .await;
    let result = h.runtime.retry().ask::<u32>(&question(), &age).await;
    assert!(matches!(result, Err(VoiceError::StorageError(_))));
}
