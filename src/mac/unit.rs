use super::*;
use super::width::check_count;
use alloc::vec::Vec;

/// Most product terms one unit may sum per cycle.
pub const MAX_TERMS: u32 = 1024;

/// Everything that is fixed when a [`ComplexMac`] is built.
///
/// Every field has a default, so a configuration can be written (or deserialised) by naming only
/// what differs from a plain 16×16-bit, single-product, 16-bit output unit.
///
/// ```
/// # use soft_cmac::*;
/// let config: MacConfig = serde_json::from_str(r#"{
///   "x_width": 18,
///   "depth": 32,
///   "rounding": "nearest",
///   "policy": { "shift_right": 12, "clip": true }
/// }"#).unwrap();
/// assert_eq!((config.x_width, config.y_width), (18, 16));
/// assert_eq!(config.depth, AccumulationDepth(32));
/// assert!(ComplexMac::new(config).is_ok());
/// ```
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MacConfig {
  pub x_width: u32,
  pub y_width: u32,
  /// Products summed per cycle (at least one, at most [`MAX_TERMS`]).
  pub num_terms: u32,
  /// Accumulation cycles the accumulator must hold without overflow.
  pub depth: AccumulationDepth,
  /// Width of the hardware accumulator: required for an unbounded `depth`, a ceiling otherwise.
  pub max_accumulator_width: Option<u32>,
  pub output_width: u32,
  pub rounding: RoundingMode,
  pub policy: OutputPolicy,
  pub features: Features,
  /// Use this strategy instead of the cheapest one that fits.
  pub strategy: Option<Strategy>,
  pub num_input_registers: u32,
  pub num_output_registers: u32,
}

impl Default for MacConfig {
  fn default() -> Self {
    Self {
      x_width: 16,
      y_width: 16,
      num_terms: 1,
      depth: AccumulationDepth::SINGLE,
      max_accumulator_width: None,
      output_width: 16,
      rounding: RoundingMode::default(),
      policy: OutputPolicy::default(),
      features: Features::default(),
      strategy: None,
      num_input_registers: 1,
      num_output_registers: 1,
    }
  }
}

impl MacConfig {
  /// The depth the guard bits are sized for: every cycle adds `num_terms` products, plus the
  /// auxiliary summand if there is one, plus the chain input if it is accumulated.
  ///
  /// Like the auxiliary summand, the chain counts as one product-sized summand; a chain value
  /// wider than a product can overflow the accumulator before `depth` cycles.
  pub fn summand_depth(&self) -> AccumulationDepth {
    if self.depth.is_unbounded() { return AccumulationDepth::UNBOUNDED }
    let per_cycle = self.num_terms.max(1)
      .saturating_add(u32::from(self.features.use_aux_summand))
      .saturating_add(u32::from(self.features.use_chain && self.features.accumulate_with_chain));
    AccumulationDepth(self.depth.0.saturating_mul(per_cycle))
  }
}

/// One product term `±x·y`, with optional conjugation of either factor.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct Term {
  pub x: ComplexOperand,
  pub y: ComplexOperand,
  /// Subtract the product instead of adding it.
  pub negate: bool,
  pub conj_x: bool,
  pub conj_y: bool,
}

impl Term {
  pub const fn new(x: ComplexOperand, y: ComplexOperand) -> Self {
    Self { x, y, negate: false, conj_x: false, conj_y: false }
  }

  pub const fn with_negate(mut self, negate: bool) -> Self { self.negate = negate; self }

  pub const fn with_conj_x(mut self, conj_x: bool) -> Self { self.conj_x = conj_x; self }

  pub const fn with_conj_y(mut self, conj_y: bool) -> Self { self.conj_y = conj_y; self }
}

/// The raw accumulator of a unit, as passed down a chain of units. It is not rounded, and its LSB
/// is the LSB of the products.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
pub struct ChainValue {
  pub re: i128,
  pub im: i128,
  pub width: u32,
  pub valid: bool,
  pub overflow: bool,
}

impl ChainValue {
  /// A valid chain value, wrapped to `width` bits.
  pub fn new(re: i128, im: i128, width: u32) -> Self {
    let width = width.clamp(1, MAX_WIDTH);
    let (re, re_overflow) = crate::underlying::resize(re, width);
    let (im, im_overflow) = crate::underlying::resize(im, width);
    Self { re, im, width, valid: true, overflow: re_overflow | im_overflow }
  }
}

/// The inputs of one cycle.
///
/// Only the first [`num_terms`](MacConfig::num_terms) terms are used; missing terms contribute
/// nothing. The auxiliary summand and the chain input are ignored unless the unit was configured
/// with the matching [`Features`]. The auxiliary summand, like the chain, is aligned with the LSB
/// of the products.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
pub struct MacInput {
  pub clear: bool,
  pub terms: Vec<Term>,
  pub aux: Option<ComplexOperand>,
  pub chain: Option<ChainValue>,
}

impl MacInput {
  /// A single-term input `x·y`.
  pub fn product(clear: bool, x: ComplexOperand, y: ComplexOperand) -> Self {
    Self { clear, terms: [Term::new(x, y)].into(), ..Self::default() }
  }

  pub fn with_term(mut self, term: Term) -> Self { self.terms.push(term); self }

  pub fn with_aux(mut self, aux: ComplexOperand) -> Self { self.aux = Some(aux); self }

  pub fn with_chain(mut self, chain: ChainValue) -> Self { self.chain = Some(chain); self }
}

/// The outputs of one cycle: the rounded, saturated `result`, and the raw accumulator for the next
/// unit down a chain.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct MacOutput {
  pub result: ComplexOperand,
  pub chain: ChainValue,
}

/// A complex multiply-accumulate unit.
///
/// Every call to [`clock`](Self::clock) is one cycle: both accumulator lanes step through the
/// [clear/valid state machine](Action) with the sum of this cycle's products (plus the auxiliary
/// summand and chain input, if configured), then the accumulator goes through the rounding unit
/// (`shift_right` lsbs dropped) and the saturation unit (down to `output_width` bits). The output
/// appears [`total_latency`](PipelineDescriptor::total_latency) cycles after its inputs went in.
///
/// ```
/// # use soft_cmac::*;
/// let mut mac = ComplexMac::new(MacConfig { depth: AccumulationDepth(4), ..MacConfig::default() }).unwrap();
/// let latency = mac.pipeline().total_latency();
/// let x = ComplexOperand::new(3, 4, 16).unwrap();
/// let y = ComplexOperand::new(5, -2, 16).unwrap();
/// let mut outputs = Vec::new();
/// for clear in [true, false] {
///   outputs.push(mac.clock(&MacInput::product(clear, x, y)));
/// }
/// for _ in 0 .. latency {
///   outputs.push(mac.clock(&MacInput::default()));
/// }
/// // (3+4j)(5-2j) = 23+14j, accumulated twice
/// let result = outputs[latency as usize + 1].result;
/// assert_eq!((result.re().value(), result.im().value()), (46, 28));
/// assert!(result.valid());
/// ```
#[derive(Clone, Debug)]
pub struct ComplexMac {
  config: MacConfig,
  budget: WidthBudget,
  strategy: Strategy,
  pipeline: PipelineDescriptor,
  re: Accumulator,
  im: Accumulator,
  delay: DelayLine<MacOutput>,
}

impl ComplexMac {
  /// Validate `config` and build the unit: width budget, strategy, and pipeline.
  pub fn new(config: MacConfig) -> Result<Self, ConfigurationError> {
    check_count("terms", config.num_terms, MAX_TERMS)?;
    let config = MacConfig { num_terms: config.num_terms.max(1), ..config };
    let budget = WidthBudget::new(
      config.x_width,
      config.y_width,
      config.summand_depth(),
      config.max_accumulator_width,
      config.output_width,
      &config.policy,
    )?;
    let strategy = select(config.x_width, config.y_width, config.features, config.strategy)?;
    let pipeline = PipelineDescriptor::new(
      config.num_input_registers,
      strategy.internal_latency(),
      config.num_output_registers,
    )?;
    tracing::debug!(
      ?strategy,
      rounding_stage = ?strategy.rounding_stage(config.features),
      product_width = budget.product_width(),
      guard_bits = budget.guard_bits(),
      accumulator_width = budget.accumulator_width(),
      output_width = budget.output_width(),
      latency = pipeline.total_latency(),
      "configured complex multiply-accumulate"
    );

    let accumulator = Accumulator::new(budget.accumulator_width());
    let idle = Self::idle_output(&budget);
    Ok(Self {
      config,
      budget,
      strategy,
      pipeline,
      re: accumulator.clone(),
      im: accumulator,
      delay: DelayLine::new(pipeline.total_latency(), idle),
    })
  }

  /// What the output shows before the first input has made it through.
  pub(crate) fn idle_output(budget: &WidthBudget) -> MacOutput {
    MacOutput {
      result: ComplexOperand::zero(budget.output_width()),
      chain: ChainValue { width: budget.accumulator_width(), ..ChainValue::default() },
    }
  }

  /// Advance one cycle: feed in `input`, and return the output of the input that went in
  /// `total_latency` cycles ago.
  pub fn clock(&mut self, input: &MacInput) -> MacOutput {
    let output = self.step(input);
    self.delay.shift(output)
  }

  /// Advance one cycle, and return the output for `input` without the pipeline delay.
  pub(crate) fn step(&mut self, input: &MacInput) -> MacOutput {
    let features = self.config.features;
    let acc_width = self.budget.accumulator_width();

    // An input with no operands at all is not valid.
    let mut any = false;
    let mut valid = true;
    let mut reset = false;
    let mut overflow = false;
    let mut absorb = |v: bool, r: bool, o: bool| {
      any = true;
      valid &= v;
      reset |= r;
      overflow |= o;
    };

    let terms = &input.terms[.. input.terms.len().min(self.config.num_terms as usize)];
    let mut re = Vec::with_capacity(terms.len() + 2);
    let mut im = Vec::with_capacity(terms.len() + 2);
    for term in terms {
      let x = term.x.resize(self.config.x_width);
      let y = term.y.resize(self.config.y_width);
      for operand in [x, y] {
        absorb(operand.valid(), operand.reset(), operand.overflow());
      }
      // Conjugation negates the imaginary part exactly: `-min` needs one more bit, which the
      // product width already has.
      let conj = |z: ComplexOperand, c: bool| {
        let im = z.im().value();
        (z.re().value(), if c { -im } else { im })
      };
      let (p_re, p_im) = self.strategy.multiply(conj(x, term.conj_x), conj(y, term.conj_y));
      re.push(Summand { value: p_re, negate: term.negate });
      im.push(Summand { value: p_im, negate: term.negate });
    }

    if features.use_aux_summand && let Some(aux) = input.aux {
      let aux = aux.resize(acc_width);
      absorb(aux.valid(), aux.reset(), aux.overflow());
      re.push(Summand::add(aux.re().value()));
      im.push(Summand::add(aux.im().value()));
    }

    if features.use_chain && let Some(chain) = input.chain {
      let (c_re, re_overflow) = crate::underlying::resize(chain.re, acc_width);
      let (c_im, im_overflow) = crate::underlying::resize(chain.im, acc_width);
      absorb(chain.valid, false, chain.overflow | re_overflow | im_overflow);
      re.push(Summand::add(c_re));
      im.push(Summand::add(c_im));
    }

    let valid = valid & any;

    // Without `accumulate_with_chain`, the chain input takes the place of the feedback path on
    // valid cycles. A stall still holds.
    let clear = input.clear || (features.use_chain && !features.accumulate_with_chain && valid);

    let was_overflowing = self.re.overflow() | self.im.overflow();
    self.re.clock(clear, valid, re);
    self.im.clock(clear, valid, im);
    let accumulator_overflow = self.re.overflow() | self.im.overflow();
    if accumulator_overflow && !was_overflowing {
      tracing::trace!(accumulator_width = acc_width, "accumulator overflow");
    }

    let (Some(acc_re), Some(acc_im)) = (self.re.value(), self.im.value()) else {
      // Nothing accumulated since the last reset.
      let idle = Self::idle_output(&self.budget);
      return MacOutput { result: idle.result.with_reset(reset), ..idle }
    };
    let overflow = overflow | accumulator_overflow;

    let chain = ChainValue { re: acc_re, im: acc_im, width: acc_width, valid, overflow };

    if reset && self.config.policy.reset_forces_zero {
      let result = ComplexOperand::zero(self.config.output_width).with_reset(true);
      return MacOutput { result, chain }
    }

    let (out_re, sat_re) = self.output_stage(acc_re);
    let (out_im, sat_im) = self.output_stage(acc_im);
    let saturated = self.config.policy.flag_overflow & (sat_re | sat_im);
    let result = ComplexOperand::wrapping(out_re, out_im, self.config.output_width)
      .with_valid(valid)
      .with_reset(reset)
      .with_overflow(overflow | saturated);
    MacOutput { result, chain }
  }

  /// Rounding unit then saturation unit, on one lane.
  fn output_stage(&self, accumulator: i128) -> (i128, bool) {
    let width = self.budget.accumulator_width();
    let rounded = shift_right_round(accumulator, width, self.config.policy.shift_right, self.config.rounding);
    resize_clip(rounded, width, self.config.output_width, self.config.policy.clip)
  }

  pub const fn config(&self) -> &MacConfig { &self.config }

  pub const fn budget(&self) -> &WidthBudget { &self.budget }

  pub const fn strategy(&self) -> Strategy { self.strategy }

  pub const fn pipeline(&self) -> &PipelineDescriptor { &self.pipeline }

  /// Real multipliers used: the strategy's count, once per term. At most `4 × MAX_TERMS`.
  pub const fn multipliers(&self) -> u32 { self.strategy.multipliers() * self.config.num_terms }

  /// The state of the accumulator (both lanes share it).
  pub const fn state(&self) -> AccumulatorState { self.re.state() }
}
