//! Benchmarks for stepping a full life and for condition handling

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use restart_engine::condition::{cache, check_condition, parse};
use restart_engine::config::{
    AgeCatalog, AgeConfig, EngineConfig, EventCatalog, EventConfig, EventEffect, WeightedEvent,
};
use restart_engine::property::AttributeSet;
use restart_engine::simulator::{TrajectoryRunner, UserSession};

const CONDITIONS: [&str; 4] = [
    "CHR>5",
    "(INT>3)&(MNY<10)",
    "((EVT?[10001,10002])|(STR>=7))&(SPR!=0)",
    "(AGE>=18)&((MNY>5)|(INT>8))&(EVT![20001])",
];

/// 200 events spread over ages 0..=100, with a slow life drain past 60
fn create_test_runner() -> TrajectoryRunner {
    let events: Vec<EventConfig> = (1..=200)
        .map(|i| EventConfig {
            id: (10000 + i).to_string(),
            event: format!("Event {}", i),
            grade: i % 4,
            no_random: i % 50 == 0,
            include: match i % 7 {
                0 => Some(CONDITIONS[(i as usize / 7) % CONDITIONS.len()].to_string()),
                _ => None,
            },
            exclude: (i % 11 == 0).then(|| format!("EVT?[{}]", 10000 + i)),
            effect: EventEffect {
                chr: i % 3 - 1,
                mny: i % 5 - 2,
                lif: if i % 13 == 0 { -1 } else { 0 },
                ..Default::default()
            },
            branch: Vec::new(),
            post_event: None,
        })
        .collect();

    let ages = (0..=100).map(|age| AgeConfig {
        age,
        events: (0..20)
            .map(|k| WeightedEvent {
                event_id: (10001 + (age * 3 + k) % 200).to_string(),
                weight: 1.0 + f64::from(k % 3),
            })
            .collect(),
    });

    let config = EngineConfig {
        max_age: 100,
        ..Default::default()
    };
    TrajectoryRunner::validated(
        EventCatalog::new(events).expect("unique ids"),
        AgeCatalog::new(ages).expect("unique ages"),
        config,
    )
    .expect("consistent catalogs")
}

fn benchmark_full_life(c: &mut Criterion) {
    let runner = create_test_runner();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("step_many_full_life", |b| {
        b.iter(|| {
            let mut session = UserSession::new("bench");
            session.begin(0);
            runner
                .allocate_manual(&mut session, "2 2 2 2 2")
                .expect("valid allocation");
            let entries = runner.step_many_with_rng(&mut session, black_box(200), &mut rng);
            black_box(entries)
        })
    });
}

fn benchmark_condition_parsing(c: &mut Criterion) {
    let mut attributes = AttributeSet::new(5, 5, 5, 5, 5, 1);
    attributes.record_event("10001");

    c.bench_function("condition_parsing_cold", |b| {
        b.iter(|| {
            for condition in CONDITIONS {
                black_box(parse(black_box(condition)));
            }
        })
    });

    cache::clear_cache();
    c.bench_function("condition_check_cached", |b| {
        b.iter(|| {
            for condition in &CONDITIONS[..3] {
                let _ = black_box(check_condition(black_box(condition), &attributes));
            }
        })
    });
}

criterion_group!(benches, benchmark_full_life, benchmark_condition_parsing);
criterion_main!(benches);
