use super::*;
use super::width::check_count;
use alloc::vec::Vec;

/// Most stages one network may chain.
pub const MAX_STAGES: u32 = 1024;

/// A summation network: `stages` complex multiply-accumulate units connected through their chain
/// ports, summing `stages × num_terms` products per cycle.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  /// Units in the chain (at least one, at most [`MAX_STAGES`]).
  pub stages: u32,
  /// Accumulate the sums across cycles in the last stage, under control of `clear`. Otherwise
  /// every valid cycle produces a fresh sum.
  pub accumulate: bool,
  /// The configuration every stage is derived from. `depth` counts accumulation cycles of the
  /// whole network, and only the last stage applies `policy`.
  pub stage: MacConfig,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self { stages: 2, accumulate: false, stage: MacConfig::default() }
  }
}

/// A chain of [`ComplexMac`] stages. Stage `k` takes terms `k·num_terms ..` of the input, adds the
/// chain value of stage `k-1`, and passes its raw accumulator on; the last stage's result is the
/// network's result. The auxiliary summand, if any, goes into the first stage.
///
/// Every stage gets the accumulator width of the whole sum, so the chain never needs resizing.
/// Stages pick their strategy individually (the first has no chain input, only the last may need
/// to accumulate with the chain), and the stage inputs are padded so that all products of one
/// cycle meet in the last stage.
///
/// ```
/// # use soft_cmac::*;
/// let mut network = SumNetwork::new(NetworkConfig { stages: 3, ..NetworkConfig::default() }).unwrap();
/// let one = ComplexOperand::new(1, 0, 16).unwrap();
/// let j = ComplexOperand::new(0, 1, 16).unwrap();
/// let input = MacInput::product(true, one, j)
///   .with_term(Term::new(j, j))
///   .with_term(Term::new(one, one));
/// let latency = network.latency();
/// let mut output = network.clock(&input);
/// for _ in 0 .. latency {
///   output = network.clock(&MacInput::default());
/// }
/// // j + j² + 1 = j
/// assert_eq!((output.result.re().value(), output.result.im().value()), (0, 1));
/// ```
#[derive(Clone, Debug)]
pub struct SumNetwork {
  config: NetworkConfig,
  stages: Vec<ComplexMac>,
  alignment: Alignment,
  latency: u32,
  idle: MacOutput,
  delay: DelayLine<MacOutput>,
}

impl SumNetwork {
  pub fn new(config: NetworkConfig) -> Result<Self, ConfigurationError> {
    check_count("stages", config.stages, MAX_STAGES)?;
    check_count("terms", config.stage.num_terms, MAX_TERMS)?;
    let count = config.stages.max(1);
    let template = MacConfig { num_terms: config.stage.num_terms.max(1), ..config.stage };
    let config = NetworkConfig { stages: count, stage: template, ..config };

    // Size the accumulator for everything that ends up in the last stage.
    let per_cycle = count.saturating_mul(template.num_terms).saturating_add(u32::from(template.features.use_aux_summand));
    let cycles = if config.accumulate { template.depth.0 } else { 1 };
    let depth = if template.depth.is_unbounded() {
      AccumulationDepth::UNBOUNDED
    } else {
      AccumulationDepth(cycles.saturating_mul(per_cycle))
    };
    let budget = WidthBudget::new(
      template.x_width,
      template.y_width,
      depth,
      template.max_accumulator_width,
      template.output_width,
      &template.policy,
    )?;
    let accumulator_width = budget.accumulator_width();

    let stages = (0 .. count).map(|k| {
      let (first, last) = (k == 0, k == count - 1);
      let features = Features {
        use_chain: !first,
        use_aux_summand: first && template.features.use_aux_summand,
        accumulate_with_chain: last && !first && config.accumulate,
      };
      let stage = MacConfig {
        depth: AccumulationDepth::UNBOUNDED,
        max_accumulator_width: Some(accumulator_width),
        features,
        ..template
      };
      let stage = if last {
        stage
      } else {
        MacConfig {
          output_width: accumulator_width,
          policy: OutputPolicy::default(),
          num_output_registers: 0,
          ..stage
        }
      };
      ComplexMac::new(stage)
    }).collect::<Result<Vec<_>, _>>()?;

    // A product entering stage `k` passes through the accumulators of every later stage.
    let paths: Vec<u32> = stages.iter().enumerate()
      .map(|(k, stage)| {
        let pipeline = stage.pipeline();
        pipeline.num_input_registers() + pipeline.strategy_internal_latency() + (count - 1 - k as u32)
      })
      .collect();
    let alignment = align(&paths);
    let latency = alignment.latency + template.num_output_registers;

    tracing::debug!(
      stages = count,
      strategies = ?stages.iter().map(ComplexMac::strategy).collect::<Vec<_>>(),
      padding = ?alignment.padding,
      accumulator_width,
      latency,
      "configured summation network"
    );

    let idle = ComplexMac::idle_output(&budget);
    Ok(Self { config, stages, alignment, latency, idle, delay: DelayLine::new(latency, idle) })
  }

  /// Advance one cycle: feed in `input`, and return the output of the input that went in
  /// [`latency`](Self::latency) cycles ago.
  pub fn clock(&mut self, input: &MacInput) -> MacOutput {
    let output = self.step(input);
    self.delay.shift(output)
  }

  /// Advance one cycle, and return the output for `input` without the pipeline delay.
  pub(crate) fn step(&mut self, input: &MacInput) -> MacOutput {
    let last = self.stages.len() - 1;
    let mut terms = input.terms.chunks(self.config.stage.num_terms as usize);
    let mut chain = None;
    let mut output = self.idle;
    for (k, stage) in self.stages.iter_mut().enumerate() {
      // Stages after the first restart from their chain input on every valid cycle by themselves,
      // and hold through stalls.
      let clear = if k == last && self.config.accumulate { input.clear } else { k == 0 };
      let stage_input = MacInput {
        clear,
        terms: terms.next().map(<[Term]>::to_vec).unwrap_or_default(),
        aux: if k == 0 { input.aux } else { None },
        chain,
      };
      output = stage.step(&stage_input);
      chain = Some(output.chain);
    }
    output
  }

  pub const fn config(&self) -> &NetworkConfig { &self.config }

  pub fn stages(&self) -> &[ComplexMac] { &self.stages }

  /// Delay stages in front of each stage's inputs.
  pub fn padding(&self) -> &[u32] { &self.alignment.padding }

  /// Cycles from an input entering the network to its result leaving it.
  pub const fn latency(&self) -> u32 { self.latency }

  /// Real multipliers used by all stages together. At most `4 × MAX_TERMS × MAX_STAGES`.
  pub fn multipliers(&self) -> u32 { self.stages.iter().map(ComplexMac::multipliers).sum() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mac::Strategy;
  use malachite::Integer;
  use proptest::prelude::*;

  fn z(re: i128, im: i128, width: u32) -> ComplexOperand {
    ComplexOperand::new(re, im, width).unwrap()
  }

  fn products(clear: bool, pairs: &[(ComplexOperand, ComplexOperand)]) -> MacInput {
    let terms = pairs.iter().map(|&(x, y)| Term::new(x, y)).collect();
    MacInput { clear, terms, ..MacInput::default() }
  }

  fn result(output: MacOutput) -> (i128, i128) {
    (output.result.re().value(), output.result.im().value())
  }

  #[test]
  fn latency_of_uniform_stages() {
    let network = SumNetwork::new(NetworkConfig::default()).unwrap();
    assert!(network.stages().iter().all(|s| s.strategy() == Strategy::TwoMultiplierFused));
    // Paths 1+1+1 and 1+1+0
    assert_eq!(network.padding(), [0, 1]);
    assert_eq!(network.latency(), 4);
    assert_eq!(network.multipliers(), 4);
    assert!(network.stages().iter().all(|s| s.budget().accumulator_width() == 16 + 16 + 1 + 2));
  }

  #[test]
  fn latency_of_mixed_stages() {
    let config = NetworkConfig {
      stages: 2,
      accumulate: true,
      stage: MacConfig { x_width: 20, y_width: 20, output_width: 20, depth: AccumulationDepth(4), ..MacConfig::default() },
    };
    let network = SumNetwork::new(config).unwrap();
    let strategies: Vec<_> = network.stages().iter().map(ComplexMac::strategy).collect();
    // Only the last stage accumulates with the chain, which three multipliers cannot do.
    assert_eq!(strategies, [Strategy::ThreeMultiplier, Strategy::FourMultiplier]);
    // Paths 1+2+1 and 1+1+0
    assert_eq!(network.padding(), [0, 2]);
    assert_eq!(network.latency(), 5);
    assert_eq!(network.multipliers(), 7);
  }

  #[test]
  fn fresh_sum_every_cycle() {
    let mut network = SumNetwork::new(NetworkConfig::default()).unwrap();
    let input = products(false, &[(z(1, 0, 16), z(2, 0, 16)), (z(0, 1, 16), z(3, 0, 16))]);
    assert_eq!(result(network.step(&input)), (2, 3));
    assert_eq!(result(network.step(&input)), (2, 3));
    assert!(network.step(&input).result.valid());
  }

  #[test]
  fn fresh_sum_holds_on_stall() {
    let mut network = SumNetwork::new(NetworkConfig::default()).unwrap();
    let input = products(false, &[(z(1, 0, 16), z(2, 0, 16)), (z(0, 1, 16), z(3, 0, 16))]);
    assert_eq!(result(network.step(&input)), (2, 3));
    let held = network.step(&MacInput::default());
    assert!(!held.result.valid());
    assert_eq!(result(held), (2, 3));
    assert_eq!(network.stages()[1].state(), AccumulatorState::Holding);
    assert_eq!(result(network.step(&input)), (2, 3));
  }

  #[test]
  fn accumulating_network() {
    let config = NetworkConfig { accumulate: true, stage: MacConfig { depth: AccumulationDepth(8), ..MacConfig::default() }, ..NetworkConfig::default() };
    let mut network = SumNetwork::new(config).unwrap();
    let pairs = [(z(1, 0, 16), z(2, 0, 16)), (z(0, 1, 16), z(3, 0, 16))];
    assert_eq!(result(network.step(&products(true, &pairs))), (2, 3));
    assert_eq!(result(network.step(&products(false, &pairs))), (4, 6));
    let held = network.step(&MacInput::default());
    assert!(!held.result.valid());
    assert_eq!(result(held), (4, 6));
    assert_eq!(result(network.step(&products(true, &pairs))), (2, 3));
  }

  #[test]
  fn missing_terms_contribute_nothing() {
    let mut network = SumNetwork::new(NetworkConfig::default()).unwrap();
    let out = network.step(&products(true, &[(z(1, 0, 16), z(2, 0, 16))]));
    assert!(out.result.valid());
    assert_eq!(result(out), (2, 0));
  }

  #[test]
  fn aux_goes_to_the_first_stage() {
    let stage = MacConfig {
      features: Features { use_aux_summand: true, ..Features::default() },
      ..MacConfig::default()
    };
    let mut network = SumNetwork::new(NetworkConfig { stage, ..NetworkConfig::default() }).unwrap();
    let input = products(true, &[(z(1, 0, 16), z(1, 0, 16)), (z(1, 0, 16), z(1, 0, 16))]).with_aux(z(5, 7, 16));
    assert_eq!(result(network.step(&input)), (7, 7));
  }

  #[test]
  fn delayed_output() {
    let mut network = SumNetwork::new(NetworkConfig::default()).unwrap();
    let input = products(true, &[(z(1, 1, 16), z(1, 1, 16)), (z(2, 0, 16), z(2, 0, 16))]);
    let outputs: Vec<_> = core::iter::once(&input)
      .chain(core::iter::repeat_n(&MacInput::default(), 5))
      .map(|input| network.clock(input))
      .collect();
    let valid: Vec<_> = outputs.iter().map(|o| o.result.valid()).collect();
    assert_eq!(valid, [false, false, false, false, true, false]);
    assert_eq!(result(outputs[4]), (4, 2));
  }

  #[test]
  fn errors_propagate() {
    let stage = MacConfig {
      output_width: 36,
      policy: OutputPolicy { clip: true, ..OutputPolicy::default() },
      ..MacConfig::default()
    };
    // 2 products: 33 + 2 guard bits
    assert_eq!(
      SumNetwork::new(NetworkConfig { stage, ..NetworkConfig::default() }).err(),
      Some(ConfigurationError::InsufficientGuardBits { required: 37, available: 35 }),
    );
  }

  #[test]
  fn counts_are_bounded() {
    assert_eq!(
      SumNetwork::new(NetworkConfig { stages: u32::MAX, ..NetworkConfig::default() }).err(),
      Some(ConfigurationError::TooLarge { what: "stages", value: u32::MAX, max: MAX_STAGES }),
    );
    let stage = MacConfig { num_terms: u32::MAX, ..MacConfig::default() };
    assert_eq!(
      SumNetwork::new(NetworkConfig { stage, ..NetworkConfig::default() }).err(),
      Some(ConfigurationError::TooLarge { what: "terms", value: u32::MAX, max: MAX_TERMS }),
    );
    let stage = MacConfig { num_output_registers: u32::MAX, ..MacConfig::default() };
    assert_eq!(
      SumNetwork::new(NetworkConfig { stage, ..NetworkConfig::default() }).err(),
      Some(ConfigurationError::TooLarge { what: "output registers", value: u32::MAX, max: MAX_REGISTERS }),
    );
  }

  #[test]
  fn config_from_json() {
    let config: NetworkConfig = serde_json::from_str(r#"{ "stages": 4, "stage": { "num_terms": 2 } }"#).unwrap();
    assert_eq!(config.stages, 4);
    assert!(!config.accumulate);
    assert_eq!(config.stage.num_terms, 2);
    assert_eq!(SumNetwork::new(config).unwrap().multipliers(), 4 * 2 * 2);
  }

  proptest!{
    #[test]
    fn sums_every_product(
      pairs in proptest::collection::vec((ComplexOperand::cases_proptest(18), ComplexOperand::cases_proptest(18)), 6),
    ) {
      let config = NetworkConfig {
        stages: 3,
        stage: MacConfig { x_width: 18, y_width: 18, num_terms: 2, output_width: 64, ..MacConfig::default() },
        ..NetworkConfig::default()
      };
      let mut network = SumNetwork::new(config).unwrap();
      let out = network.step(&products(true, &pairs));

      let (mut re, mut im) = (Integer::from(0), Integer::from(0));
      for (x, y) in &pairs {
        let (xr, xi, yr, yi) = (x.re().value(), x.im().value(), y.re().value(), y.im().value());
        re += Integer::from(xr * yr - xi * yi);
        im += Integer::from(xr * yi + xi * yr);
      }
      prop_assert!(out.result.valid() && !out.result.overflow());
      prop_assert_eq!(Integer::from(out.result.re().value()), re);
      prop_assert_eq!(Integer::from(out.result.im().value()), im);
    }
  }
}
