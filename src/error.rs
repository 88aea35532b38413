//! Configuration errors. Every error is detected when a unit is configured, before any cycle is
//! run; at run time, overflow is reported as a flag on the result, never as an error.

use crate::mac::Features;

/// The reasons a multiply-accumulate configuration can be rejected.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
#[derive(thiserror::Error)]
pub enum ConfigurationError {
  /// The accumulator does not have enough bits for the requested accumulation depth, or the
  /// output is too wide for clipping / overflow detection to ever trigger.
  #[error("{required} accumulator bits are needed, but only {available} are available")]
  InsufficientGuardBits { required: u32, available: u32 },

  /// No decomposition strategy supports the operand widths together with the requested features.
  #[error("no multiply-accumulate decomposition supports {x_width}x{y_width}-bit operands with {features:?}")]
  NoStrategy { x_width: u32, y_width: u32, features: Features },

  /// A width parameter is out of the representable range or inconsistent.
  #[error("invalid width: {0}")]
  InvalidWidth(#[from] WidthIssue),

  /// A count (terms, stages, or registers) is larger than the model supports.
  #[error("{value} {what} exceed the supported maximum of {max}")]
  TooLarge { what: &'static str, value: u32, max: u32 },
}

/// What is wrong with a width parameter; see [`ConfigurationError::InvalidWidth`].
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq)]
#[derive(thiserror::Error)]
pub enum WidthIssue {
  #[error("the {what} width must be between 1 and 128 bits, got {bits}")]
  OutOfRange { what: &'static str, bits: u32 },

  #[error("an unbounded accumulation depth needs an explicit accumulator width")]
  UnboundedDepth,

  #[error("the {accumulator}-bit accumulator is narrower than the {product}-bit product")]
  NarrowerThanProduct { accumulator: u32, product: u32 },

  #[error("a shift of {shift} bits exceeds the {accumulator}-bit accumulator")]
  ShiftTooLarge { shift: u32, accumulator: u32 },
}
