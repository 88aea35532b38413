use super::*;

/// What the output stage does with the accumulator before it leaves the unit.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputPolicy {
  /// Number of lsbs dropped (with rounding) from the accumulator.
  pub shift_right: u32,
  /// Saturate instead of wrapping when the result does not fit the output width.
  pub clip: bool,
  /// Report output overflow in the result's `overflow` flag.
  pub flag_overflow: bool,
  /// While any input is in reset, output zero (and not valid).
  pub reset_forces_zero: bool,
}

/// The widths of one multiply-accumulate datapath, derived from the operand widths and the
/// accumulation depth, and validated against the output policy.
///
/// ```
/// # use soft_cmac::*;
/// let policy = OutputPolicy { clip: true, ..OutputPolicy::default() };
/// let budget = WidthBudget::new(16, 16, AccumulationDepth(4), None, 18, &policy).unwrap();
/// assert_eq!(budget.guard_bits(), 3);
/// assert_eq!(budget.accumulator_width(), 36);
/// assert_eq!(budget.usable_width(), 36);
/// ```
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct WidthBudget {
  product_width: u32,
  guard_bits: u32,
  accumulator_width: u32,
  usable_width: u32,
  output_width: u32,
}

impl WidthBudget {
  /// Derive and validate the widths.
  ///
  ///   - product width: `x_width + y_width + 1` (the `+1` holds the sum of the two partial
  ///     products of a complex product).
  ///   - accumulator width: product width plus [guard bits](GuardBits::from_depth). For an
  ///     unbounded `depth`, it is `max_accumulator_width` instead, which must then be given. For a
  ///     bounded `depth`, `max_accumulator_width` (if given) is the hardware ceiling the
  ///     accumulator must fit under.
  ///   - usable width: accumulator width minus `policy.shift_right`.
  ///
  /// If the policy asks for clipping or overflow detection, `output_width` must be strictly less
  /// than the usable width; otherwise nothing could ever overflow and the configuration is
  /// rejected with [`ConfigurationError::InsufficientGuardBits`].
  pub fn new(
    x_width: u32,
    y_width: u32,
    depth: AccumulationDepth,
    max_accumulator_width: Option<u32>,
    output_width: u32,
    policy: &OutputPolicy,
  ) -> Result<Self, ConfigurationError> {
    check_range("x operand", x_width)?;
    check_range("y operand", y_width)?;
    check_range("output", output_width)?;
    let product_width = x_width + y_width + 1;
    check_range("product", product_width)?;

    let (guard_bits, accumulator_width) = match (GuardBits::from_depth(depth), max_accumulator_width) {
      (GuardBits::Unbounded, None) => return Err(WidthIssue::UnboundedDepth.into()),
      (GuardBits::Unbounded, Some(accumulator)) => {
        check_range("accumulator", accumulator)?;
        if accumulator < product_width {
          return Err(WidthIssue::NarrowerThanProduct { accumulator, product: product_width }.into())
        }
        (accumulator - product_width, accumulator)
      }
      (GuardBits::Bits(guard), ceiling) => {
        let accumulator = product_width + guard;
        if let Some(ceiling) = ceiling {
          check_range("accumulator", ceiling)?;
          if accumulator > ceiling {
            return Err(ConfigurationError::InsufficientGuardBits { required: accumulator, available: ceiling })
          }
        }
        check_range("accumulator", accumulator)?;
        (guard, accumulator)
      }
    };

    let usable_width = accumulator_width.checked_sub(policy.shift_right)
      .ok_or(WidthIssue::ShiftTooLarge { shift: policy.shift_right, accumulator: accumulator_width })?;

    if (policy.clip || policy.flag_overflow) && output_width >= usable_width {
      return Err(ConfigurationError::InsufficientGuardBits { required: output_width + 1, available: usable_width })
    }

    Ok(Self { product_width, guard_bits, accumulator_width, usable_width, output_width })
  }

  pub const fn product_width(&self) -> u32 { self.product_width }

  pub const fn guard_bits(&self) -> u32 { self.guard_bits }

  pub const fn accumulator_width(&self) -> u32 { self.accumulator_width }

  pub const fn usable_width(&self) -> u32 { self.usable_width }

  pub const fn output_width(&self) -> u32 { self.output_width }

  /// How many products the accumulator can sum with no possibility of overflow.
  pub const fn safe_depth(&self) -> u32 { GuardBits::max_depth(self.guard_bits) }
}

fn check_range(what: &'static str, bits: u32) -> Result<(), WidthIssue> {
  if (1 ..= MAX_WIDTH).contains(&bits) { Ok(()) } else { Err(WidthIssue::OutOfRange { what, bits }) }
}

pub(super) fn check_count(what: &'static str, value: u32, max: u32) -> Result<(), ConfigurationError> {
  if value <= max { Ok(()) } else { Err(ConfigurationError::TooLarge { what, value, max }) }
}
