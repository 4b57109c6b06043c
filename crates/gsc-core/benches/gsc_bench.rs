//! Benchmarks for the canceller's per-frame path
//!
//! Run with: cargo bench -p gsc-core --bench gsc_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gsc_core::prelude::*;
use gsc_core::rls::RlsCanceller;
use gsc_core::scenario::{Scenario, ScenarioConfig};
use std::time::Duration;

// ============================================================================
// Full frame
// ============================================================================

fn bench_process_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_frame");
    group.measurement_time(Duration::from_secs(5));

    for &(nchannel, nchannel_ds) in [(4, 2), (8, 4), (8, 8), (16, 4)].iter() {
        let nfft = 512;
        let mut scenario = Scenario::new(ScenarioConfig {
            nfft,
            nchannel,
            onset_frame: 0,
            noise_std: 0.05,
            ..Default::default()
        })
        .unwrap();

        let params = GscParams::builder()
            .nfft(nfft)
            .sample_rate(16_000.0)
            .channels(nchannel, nchannel_ds)
            .f_max(8_000.0)
            .build();
        let mut gsc = GeneralizedSidelobeCanceller::new(params, &scenario.steering_weights()).unwrap();

        let frames: Vec<_> = scenario.take_frames(64).into_iter().map(|f| f.input).collect();
        let mut output = vec![Complex::new(0.0, 0.0); nfft / 2 + 1];

        group.throughput(Throughput::Elements((nfft / 2 + 1) as u64));
        let id = format!("{}ch_{}ds", nchannel, nchannel_ds);
        group.bench_function(BenchmarkId::new("nfft512", id), |b| {
            let mut k = 0;
            b.iter(|| {
                gsc.process(black_box(&frames[k % frames.len()]), &mut output).unwrap();
                k += 1;
            })
        });
    }

    group.finish();
}

// ============================================================================
// RLS stage alone
// ============================================================================

fn bench_rls_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("rls_update");

    for &order in [1usize, 2, 4, 8].iter() {
        let nbins = 256;
        let mut rls = RlsCanceller::new(nbins, order, 0.99, 1e-2);
        let refs: Vec<Complex> = (0..nbins * order)
            .map(|i| Complex::from_polar(1.0, 0.37 * i as f64))
            .collect();
        let fixed: Vec<Complex> = (0..nbins)
            .map(|i| Complex::from_polar(2.0, 0.11 * i as f64))
            .collect();
        let active = vec![true; nbins];

        group.throughput(Throughput::Elements(nbins as u64));
        group.bench_with_input(BenchmarkId::new("order", order), &order, |b, _| {
            b.iter(|| rls.update_all(black_box(&refs), black_box(&fixed), &active))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process_frame, bench_rls_update);
criterion_main!(benches);
