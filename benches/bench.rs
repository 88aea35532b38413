use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use soft_cmac::*;

// Output stage units on their own

fn round(c: &mut Criterion) {
  let mut g = c.benchmark_group("shift_right_round");
  for mode in [RoundingMode::Floor, RoundingMode::Nearest, RoundingMode::Truncate] {
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::from_parameter(format_args!("{mode:?}")), &mode, |b, &mode| {
      b.iter(|| shift_right_round(black_box(-0x1234_5678_9abc), 48, black_box(17), mode));
    });
  }
  g.finish();
}

fn saturate(c: &mut Criterion) {
  let mut g = c.benchmark_group("resize_clip");
  for value in [0x7fff_i128, 0x1_0000_0000, -0x1_0000_0000] {
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::from_parameter(value), &value, |b, &value| {
      b.iter(|| resize_clip(black_box(value), 48, 16, true));
    });
  }
  g.finish();
}

// Configuration

fn configure(c: &mut Criterion) {
  let config = MacConfig {
    x_width: 20,
    y_width: 20,
    depth: AccumulationDepth(1024),
    output_width: 24,
    policy: OutputPolicy { shift_right: 16, clip: true, ..OutputPolicy::default() },
    ..MacConfig::default()
  };
  c.bench_function("configure_mac", |b| {
    b.iter(|| ComplexMac::new(black_box(config)));
  });
}

// Whole units, one cycle at a time

fn clock_mac(c: &mut Criterion) {
  let mut g = c.benchmark_group("clock_mac");
  for strategy in Strategy::BY_COST {
    let config = MacConfig {
      x_width: 18,
      y_width: 18,
      depth: AccumulationDepth(256),
      output_width: 18,
      rounding: RoundingMode::Nearest,
      policy: OutputPolicy { shift_right: 20, clip: true, flag_overflow: true, ..OutputPolicy::default() },
      strategy: Some(strategy),
      ..MacConfig::default()
    };
    let Ok(mut mac) = ComplexMac::new(config) else { continue };
    let x = ComplexOperand::new(12345, -23456, 18).unwrap();
    let y = ComplexOperand::new(-4321, 7654, 18).unwrap();
    let input = MacInput::product(false, x, y);
    mac.clock(&MacInput::product(true, x, y));
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::from_parameter(format_args!("{strategy:?}")), &input, |b, input| {
      b.iter(|| mac.clock(black_box(input)));
    });
  }
  g.finish();
}

fn clock_network(c: &mut Criterion) {
  let mut g = c.benchmark_group("clock_network");
  for stages in [2_u32, 4, 8] {
    let config = NetworkConfig {
      stages,
      accumulate: true,
      stage: MacConfig { depth: AccumulationDepth(64), num_terms: 2, output_width: 24, ..MacConfig::default() },
    };
    let mut network = SumNetwork::new(config).unwrap();
    let x = ComplexOperand::new(1234, -5678, 16).unwrap();
    let y = ComplexOperand::new(-321, 765, 16).unwrap();
    let input = (0 .. 2 * stages).fold(MacInput { clear: false, ..MacInput::default() }, |input, _| {
      input.with_term(Term::new(x, y))
    });
    network.clock(&MacInput { clear: true, ..input.clone() });
    g.throughput(Throughput::Elements(u64::from(2 * stages)));
    g.bench_with_input(BenchmarkId::from_parameter(stages), &input, |b, input| {
      b.iter(|| network.clock(black_box(input)));
    });
  }
  g.finish();
}

criterion_group!(units, round, saturate);
criterion_group!(mac, configure, clock_mac, clock_network);
criterion_main!(units, mac);
