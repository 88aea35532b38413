use super::*;

/// Optional datapath features a multiply-accumulate unit can be asked for.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Features {
  /// Add the raw accumulator of an upstream unit (the *chain input*).
  pub use_chain: bool,
  /// Add an extra complex addend (the *auxiliary summand*) on every valid cycle.
  pub use_aux_summand: bool,
  /// Keep accumulating while the chain input is in use. Without it, the chain input replaces the
  /// accumulator feedback and every valid cycle restarts from it.
  pub accumulate_with_chain: bool,
}

/// A scheme for realising one complex multiply-accumulate with real-valued multiply-accumulate
/// units.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  /// Four real products, two per output lane. Supports everything, costs the most.
  FourMultiplier,
  /// Three real products sharing a temporary product (Gauss's trick). The extra pre-adder and
  /// temporary stage cost a cycle, and occupy the paths an auxiliary summand or an accumulating
  /// chain would need.
  ThreeMultiplier,
  /// Two fused dual-multiplier units, one per output lane. Cheapest, narrowest operands.
  TwoMultiplierFused,
}

/// The capability table of a [`Strategy`].
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct Capabilities {
  /// Real multipliers per complex product.
  pub multipliers: u32,
  /// Pipeline stages between the input registers and the accumulator output.
  pub internal_latency: u32,
  /// Widest operand the multipliers accept, or `None` for no limit.
  pub max_operand_width: Option<u32>,
  pub chain: bool,
  pub aux_summand: bool,
  pub accumulate_with_chain: bool,
  /// Rounding can be folded into the accumulator (as a rounding constant) even with both the chain
  /// and the auxiliary summand in use.
  pub round_with_chain_and_aux: bool,
}

/// Where the rounding of the output shift is performed.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub enum RoundingStage {
  /// In the multiply-accumulate unit, as a rounding constant added to the accumulator.
  Accumulator,
  /// In the output logic, by the rounding unit, after the accumulator.
  OutputLogic,
}

impl Strategy {
  /// All strategies, cheapest first: the order in which [`select`] tries them.
  pub const BY_COST: [Self; 3] = [Self::TwoMultiplierFused, Self::ThreeMultiplier, Self::FourMultiplier];

  pub const fn capabilities(self) -> Capabilities {
    match self {
      Self::FourMultiplier => Capabilities {
        multipliers: 4,
        internal_latency: 1,
        max_operand_width: None,
        chain: true,
        aux_summand: true,
        accumulate_with_chain: true,
        round_with_chain_and_aux: true,
      },
      Self::ThreeMultiplier => Capabilities {
        multipliers: 3,
        internal_latency: 2,
        max_operand_width: Some(24),
        chain: true,
        aux_summand: false,
        accumulate_with_chain: false,
        round_with_chain_and_aux: true,
      },
      Self::TwoMultiplierFused => Capabilities {
        multipliers: 2,
        internal_latency: 1,
        max_operand_width: Some(18),
        chain: true,
        aux_summand: true,
        accumulate_with_chain: true,
        round_with_chain_and_aux: false,
      },
    }
  }

  pub const fn multipliers(self) -> u32 { self.capabilities().multipliers }

  pub const fn internal_latency(self) -> u32 { self.capabilities().internal_latency }

  /// Whether this strategy can serve `x_width` × `y_width` operands with `features`.
  pub fn supports(self, x_width: u32, y_width: u32, features: Features) -> bool {
    let caps = self.capabilities();
    let width_ok = caps.max_operand_width.is_none_or(|max| x_width.max(y_width) <= max);
    let chain_ok = !features.use_chain || caps.chain;
    let aux_ok = !features.use_aux_summand || caps.aux_summand;
    // Accumulating while chained only means something when the chain is in use.
    let accumulate_ok = !(features.use_chain && features.accumulate_with_chain) || caps.accumulate_with_chain;
    width_ok && chain_ok && aux_ok && accumulate_ok
  }

  /// Where rounding happens for `features`.
  pub const fn rounding_stage(self, features: Features) -> RoundingStage {
    if features.use_chain && features.use_aux_summand && !self.capabilities().round_with_chain_and_aux {
      RoundingStage::OutputLogic
    } else {
      RoundingStage::Accumulator
    }
  }

  /// The complex product `x · y`, of two `(re, im)` pairs, evaluated the way this strategy's
  /// decomposition does it. All strategies agree bit for bit; only their resource and latency
  /// figures differ.
  ///
  /// With operands of `x_width` and `y_width` bits, every intermediate fits in
  /// `x_width + y_width + 1` bits, which configuration keeps within an `i128`.
  pub fn multiply(self, (xr, xi): (i128, i128), (yr, yi): (i128, i128)) -> (i128, i128) {
    match self {
      Self::FourMultiplier => {
        let (rr, ii) = (xr.wrapping_mul(yr), xi.wrapping_mul(yi));
        let (ri, ir) = (xr.wrapping_mul(yi), xi.wrapping_mul(yr));
        (rr.wrapping_sub(ii), ri.wrapping_add(ir))
      }
      Self::ThreeMultiplier => {
        // t = yr (xr + xi) is the temporary product shared by both lanes:
        //   re = t - xi (yr + yi)
        //   im = t + xr (yi - yr)
        let t = yr.wrapping_mul(xr.wrapping_add(xi));
        let re = t.wrapping_sub(xi.wrapping_mul(yr.wrapping_add(yi)));
        let im = t.wrapping_add(xr.wrapping_mul(yi.wrapping_sub(yr)));
        (re, im)
      }
      Self::TwoMultiplierFused => {
        // Each fused unit produces a sum of two products in one go.
        let fused = |a: i128, b: i128, c: i128, d: i128| a.wrapping_mul(b).wrapping_add(c.wrapping_mul(d));
        (fused(xr, yr, xi.wrapping_neg(), yi), fused(xr, yi, xi, yr))
      }
    }
  }
}

/// The strategy selector: the cheapest strategy whose capabilities admit `x_width` × `y_width`
/// operands with `features`, or the `pinned` strategy if one is given and it admits them.
///
/// ```
/// # use soft_cmac::*;
/// let none = Features::default();
/// assert_eq!(select(16, 16, none, None), Ok(Strategy::TwoMultiplierFused));
/// assert_eq!(select(20, 20, none, None), Ok(Strategy::ThreeMultiplier));
/// let aux = Features { use_aux_summand: true, ..none };
/// assert_eq!(select(20, 20, aux, None), Ok(Strategy::FourMultiplier));
/// assert!(select(20, 20, aux, Some(Strategy::ThreeMultiplier)).is_err());
/// ```
pub fn select(
  x_width: u32,
  y_width: u32,
  features: Features,
  pinned: Option<Strategy>,
) -> Result<Strategy, ConfigurationError> {
  let chosen = match pinned {
    Some(strategy) => Some(strategy).filter(|s| s.supports(x_width, y_width, features)),
    None => Strategy::BY_COST.into_iter().find(|s| s.supports(x_width, y_width, features)),
  };
  chosen.ok_or(ConfigurationError::NoStrategy { x_width, y_width, features })
}
