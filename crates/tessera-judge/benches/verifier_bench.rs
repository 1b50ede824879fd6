use criterion::{criterion_group, criterion_main, Criterion};

use tessera_core::config::{DomainSchema, JudgeConfig, RiskyPattern, Severity};
use tessera_core::tile::TileId;
use tessera_core::traits::ContextTile;
use tessera_judge::{Lane, Verifier};

fn context(n: usize) -> Vec<ContextTile> {
    (0..n)
        .map(|i| ContextTile {
            tile_id: TileId::new(format!("t-{i:03}")),
            topic: format!("topic {i}"),
            content: format!(
                "Drug {i} is dosed at {} mg daily. It is cleared by the kidneys. \
                 Elderly patients need lower doses. Monitoring of renal function is advised.",
                100 + i
            ),
            certainty: 70.0,
        })
        .collect()
}

fn schema() -> DomainSchema {
    let mut schema = DomainSchema::new("medical");
    schema.risky_patterns.push(RiskyPattern {
        pattern: "no side effects".into(),
        claim_type: "safety_claim".into(),
        severity: Severity::Critical,
    });
    schema
}

fn bench_verify_advanced(c: &mut Criterion) {
    let verifier = Verifier::new(JudgeConfig::default());
    let context = context(5);
    let schema = schema();
    let candidate = "Drug 3 is dosed at 103 mg daily and it is cleared by the kidneys. \
                     Elderly patients may need lower doses, so renal function should be monitored.";

    c.bench_function("verify_advanced_5_tiles", |b| {
        b.iter(|| verifier.verify(Lane::Advanced, candidate, &schema, &context, Some(0.8)));
    });
}

fn bench_verify_basic(c: &mut Criterion) {
    let verifier = Verifier::new(JudgeConfig::default());
    let schema = schema();
    let candidate = "Rest and fluids usually help. Most patients recover within a week.";

    c.bench_function("verify_basic", |b| {
        b.iter(|| verifier.verify(Lane::Basic, candidate, &schema, &[], None));
    });
}

criterion_group!(benches, bench_verify_advanced, bench_verify_basic);
criterion_main!(benches);
