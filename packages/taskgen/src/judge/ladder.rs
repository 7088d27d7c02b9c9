use async_trait::async_trait;
use common::retry::{RetryDecision, RetryLog, RetryPolicy};
use tracing::{info, warn};

use super::JudgeError;
use super::parse::{JudgeParse, extract_json};
use super::schema::{ScoreCard, ScoreSchema};

/// Anything that can turn a grading prompt into raw model text.
#[async_trait]
pub trait JudgeProvider: Send + Sync {
    /// Identifier recorded in attempt history, usually the model name.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError>;
}

#[derive(Debug, Clone)]
pub struct Verdict {
    pub card: ScoreCard,
    pub passed: bool,
    pub provider: String,
    pub round: u8,
}

/// Ordered providers tried in turn each round until one yields a valid card.
pub struct JudgeLadder {
    providers: Vec<Box<dyn JudgeProvider>>,
    policy: RetryPolicy,
}

impl JudgeLadder {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            providers: Vec::new(),
            policy,
        }
    }

    pub fn with_provider(mut self, provider: impl JudgeProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn evaluate(&self, prompt: &str, schema: &ScoreSchema) -> Result<Verdict, JudgeError> {
        if self.providers.is_empty() {
            return Err(JudgeError::NoProviders);
        }

        let mut log = RetryLog::new(self.policy);
        loop {
            let round = log.round();
            for provider in &self.providers {
                match attempt(provider.as_ref(), prompt, schema).await {
                    Ok(card) => {
                        let passed = card.passes(schema);
                        info!(
                            provider = provider.name(),
                            round,
                            total = card.total,
                            max_total = schema.max_total,
                            passed,
                            "Judge returned a valid score"
                        );
                        return Ok(Verdict {
                            card,
                            passed,
                            provider: provider.name().to_string(),
                            round,
                        });
                    }
                    Err(e) => {
                        warn!(provider = provider.name(), round, error = %e, "Judge attempt failed");
                        log.record_failure(provider.name(), &e.to_string());
                    }
                }
            }

            match log.finish_round() {
                RetryDecision::Retry { next_round, delay } => {
                    info!(next_round, delay_ms = delay.as_millis() as u64, "Retrying judge");
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Exhausted { history } => {
                    return Err(JudgeError::Exhausted { attempts: history });
                }
            }
        }
    }
}

async fn attempt(
    provider: &dyn JudgeProvider,
    prompt: &str,
    schema: &ScoreSchema,
) -> Result<ScoreCard, JudgeError> {
    let text = provider.complete(prompt).await?;
    match extract_json(&text) {
        JudgeParse::Parsed(value) => schema.validate(&value).map_err(JudgeError::Invalid),
        JudgeParse::Unparsable => Err(JudgeError::Unparsable),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::rubric::RubricItem;

    /// Replays canned responses, one per call, repeating the last.
    struct Scripted {
        name: &'static str,
        replies: Vec<Result<&'static str, ()>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JudgeProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _prompt: &str) -> Result<String, JudgeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.replies[n.min(self.replies.len() - 1)];
            reply
                .map(str::to_string)
                .map_err(|_| JudgeError::Transport("connection reset".into()))
        }
    }

    fn schema() -> ScoreSchema {
        ScoreSchema::from_rubric(&[
            RubricItem::new("Accuracy", "", 10),
            RubricItem::new("Clarity", "", 10),
        ])
    }

    const VALID: &str = "```json\n{\"accuracy_score\": 8, \"clarity_score\": 4, \"total\": 12, \"feedback\": \"fine\"}\n```";
    const FAILING: &str = "{\"accuracy_score\": 2, \"clarity_score\": 1, \"total\": 3, \"feedback\": \"thin\"}";

    fn scripted(
        name: &'static str,
        replies: Vec<Result<&'static str, ()>>,
    ) -> (Scripted, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Scripted {
                name,
                replies,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn falls_back_within_a_round() {
        let (primary, primary_calls) = scripted("primary", vec![Ok("no idea")]);
        let (fallback, fallback_calls) = scripted("fallback", vec![Ok(VALID)]);
        let ladder = JudgeLadder::new(RetryPolicy::immediate(3))
            .with_provider(primary)
            .with_provider(fallback);

        let verdict = ladder.evaluate("grade", &schema()).await.unwrap();
        assert_eq!(verdict.provider, "fallback");
        assert_eq!(verdict.round, 1);
        assert_eq!(verdict.card.total, 12);
        assert!(verdict.passed);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_in_a_later_round() {
        let (primary, _) = scripted("primary", vec![Err(()), Ok(FAILING)]);
        let (fallback, _) = scripted("fallback", vec![Ok("{\"total\": 99}")]);
        let ladder = JudgeLadder::new(RetryPolicy::immediate(3))
            .with_provider(primary)
            .with_provider(fallback);

        let verdict = ladder.evaluate("grade", &schema()).await.unwrap();
        assert_eq!(verdict.provider, "primary");
        assert_eq!(verdict.round, 2);
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn exhaustion_reports_every_attempt() {
        let (primary, primary_calls) = scripted("primary", vec![Err(())]);
        let (fallback, _) = scripted("fallback", vec![Ok("[]")]);
        let ladder = JudgeLadder::new(RetryPolicy::immediate(2))
            .with_provider(primary)
            .with_provider(fallback);

        match ladder.evaluate("grade", &schema()).await {
            Err(JudgeError::Exhausted { attempts }) => {
                assert_eq!(attempts.len(), 4);
                assert_eq!(attempts[0].provider, "primary");
                assert_eq!(attempts[1].provider, "fallback");
                assert_eq!(attempts[3].round, 2);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_ladder_is_an_error() {
        let ladder = JudgeLadder::new(RetryPolicy::immediate(1));
        assert!(matches!(
            ladder.evaluate("grade", &schema()).await,
            Err(JudgeError::NoProviders)
        ));
    }
}
