//! Property tests: attempt bound and confidence range over arbitrary provider scripts.

use std::sync::Arc;

use proptest::prelude::*;

use tessera_core::config::{DomainSchema, JudgeConfig};
use tessera_core::traits::{CancellationToken, ITileRetriever};
use tessera_judge::JudgePipeline;
use test_fixtures::{
    golden_domains, CountingRetriever, FixedComplexity, ScriptStep, ScriptedProvider, TileBuilder,
};

fn step() -> impl Strategy<Value = ScriptStep> {
    prop_oneof![
        Just(ScriptStep::answer("Aspirin relieves mild pain, and it may upset the stomach.")),
        Just(ScriptStep::answer("The usual adult dose of aspirin is 300 mg per day.")),
        Just(ScriptStep::answer("The usual adult dose of aspirin is 900 mg per day.")),
        Just(ScriptStep::answer("It always works. It does not always work.")),
        Just(ScriptStep::answer("")),
        Just(ScriptStep::Timeout),
        Just(ScriptStep::Fail("boom".into())),
        (0.0f64..=1.0).prop_map(|c| ScriptStep::Answer {
            text: "This drug has no side effects.".into(),
            self_confidence: Some(c),
        }),
    ]
}

fn medical() -> DomainSchema {
    golden_domains()
        .into_iter()
        .find(|d| d.code == "medical")
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn attempts_and_confidence_are_bounded(
        steps in prop::collection::vec(step(), 1..6),
        max_attempts in 1u32..=4,
        complexity in 0.0f64..=1.0,
        downgrade in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let provider = Arc::new(ScriptedProvider::new(steps));
        let retriever: Arc<dyn ITileRetriever> = Arc::new(CountingRetriever::new(vec![
            TileBuilder::new("med-aspirin")
                .domain("medical")
                .topic("aspirin dosing")
                .content("The usual adult dose of aspirin is 300 mg per day.")
                .build(),
        ]));
        let config = JudgeConfig {
            max_attempts,
            downgrade_on_timeout: downgrade,
            ..JudgeConfig::default()
        };
        let pipeline = JudgePipeline::new(
            Arc::clone(&provider),
            retriever,
            Arc::new(FixedComplexity(complexity)),
            config,
        );

        let result = runtime
            .block_on(pipeline.judge("What is the aspirin dose?", &medical(), &CancellationToken::new()))
            .unwrap();

        prop_assert!(result.attempts <= max_attempts);
        prop_assert!(provider.call_count() as u32 <= max_attempts);
        prop_assert_eq!(provider.call_count() as u32, result.attempts);
        prop_assert!((0.0..=1.0).contains(&result.confidence));
        if let Some(f) = result.factual {
            prop_assert!((0.0..=1.0).contains(&f));
        }
        if let Some(risk) = result.hallucination_risk {
            prop_assert!((0.0..=1.0).contains(&risk.score));
        }
        if result.passed() {
            prop_assert!(result.candidate.is_some());
        }
    }
}
