//! Fusion benchmark: record_and_classify at steady state (full window).

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proctor_monitor::config::{FusionConfig, LabelConfig};
use proctor_monitor::perception::GazeState;
use proctor_monitor::risk::{FusionEngine, RiskInputEvent};

fn engine() -> FusionEngine {
    FusionEngine::new(FusionConfig::default(), LabelConfig::default())
}

fn bench_single_student(c: &mut Criterion) {
    let engine = engine();
    let event = RiskInputEvent::new("student_101", Utc::now())
        .with_label("cell phone")
        .with_gaze(GazeState::Sideways)
        .with_lean(0.3);
    for _ in 0..30 {
        engine.record_and_classify(&event).unwrap();
    }

    c.bench_function("record_and_classify_full_window", |b| {
        b.iter(|| black_box(engine.record_and_classify(black_box(&event))))
    });
}

fn bench_by_student_count(c: &mut Criterion) {
    let mut g = c.benchmark_group("record_and_classify_by_students");
    for n in [1usize, 60, 600] {
        let engine = engine();
        let events: Vec<RiskInputEvent> = (0..n)
            .map(|i| RiskInputEvent::new(format!("student_{}", i), Utc::now()).with_label("paper"))
            .collect();
        for ev in &events {
            engine.record_and_classify(ev).unwrap();
        }
        g.bench_function(format!("students_{}", n).as_str(), |b| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % events.len();
                black_box(engine.record_and_classify(&events[i]))
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_single_student, bench_by_student_count);
criterion_main!(benches);
