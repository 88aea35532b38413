use super::*;

/// How the bits dropped by a right shift are rounded into the result.
///
/// Throughout, `v` is the value being shifted and `n` the shift amount, so that the exact result
/// is the rational number `v / 2^n`.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
  /// Towards −∞: a plain arithmetic shift, `⌊v / 2^n⌋`.
  #[default]
  Floor,
  /// To nearest, ties towards +∞: `⌊v / 2^n + 1/2⌋`.
  Nearest,
  /// Towards +∞: `⌈v / 2^n⌉`.
  Ceil,
  /// Towards zero.
  Truncate,
  /// Away from zero.
  ToInfinity,
}

/// The rounding unit: shift the signed `width`-bit `value` right by `n` bits, rounding the dropped
/// bits according to `mode`, and sign-extend the result back to `width` bits.
///
/// `n == 0` is the identity for every mode. Rounding alone never overflows `width`: the magnitude
/// only shrinks, and the one-unit increment of `Ceil`, `Nearest` and `ToInfinity` always has room
/// once at least one bit was dropped.
///
/// # Example
///
/// ```
/// # use soft_cmac::{RoundingMode, shift_right_round};
/// // -7 / 4 = -1.75
/// assert_eq!(shift_right_round(-7, 8, 2, RoundingMode::Floor), -2);
/// assert_eq!(shift_right_round(-7, 8, 2, RoundingMode::Ceil), -1);
/// assert_eq!(shift_right_round(-7, 8, 2, RoundingMode::Nearest), -2);
/// assert_eq!(shift_right_round(-7, 8, 2, RoundingMode::Truncate), -1);
/// assert_eq!(shift_right_round(-7, 8, 2, RoundingMode::ToInfinity), -2);
/// ```
pub fn shift_right_round(value: i128, width: u32, n: u32, mode: RoundingMode) -> i128 {
  debug_assert!(value.fits_signed(width), "{value} does not fit in {width} bits");
  if n == 0 { return value }

  // Split `value` into the part that survives the shift (`floor`, already rounded towards −∞) and
  // the dropped bits. Every mode is `floor` plus a 0/1 increment:
  //
  //   - `sticky`: any dropped bit is set, i.e. `value / 2^n` is not an integer.
  //   - `half`: the most significant dropped bit is set, i.e. the fractional part is ≥ 1/2. Adding
  //     2^(n-1) before shifting carries into `floor` exactly when this bit is set, so we can test
  //     it directly instead of doing the addition (which could overflow at `width == 128`).
  let floor = value.asr(n);
  let sticky = value.mask_lsb(n) != 0;
  let half = value.get_bit(n - 1);
  let negative = value < 0;

  let round_up = match mode {
    RoundingMode::Floor => false,
    RoundingMode::Ceil => sticky,
    RoundingMode::Nearest => half,
    RoundingMode::Truncate => negative & sticky,
    RoundingMode::ToInfinity => !negative & sticky,
  };
  (floor + i128::from(round_up)).wrap_signed(width)
}

impl Fixed {
  /// Apply the rounding unit to `self`; see [`shift_right_round`]. The width and the control
  /// flags are unchanged.
  ///
  /// ```
  /// # use soft_cmac::{Fixed, RoundingMode};
  /// let x = Fixed::new(0x1234, 16).unwrap();
  /// assert_eq!(x.shift_right_round(8, RoundingMode::Nearest).value(), 0x12);
  /// ```
  pub fn shift_right_round(self, n: u32, mode: RoundingMode) -> Self {
    // Unsigned values are non-negative, so rounding them as signed values of a wider type is the
    // same thing.
    let width = if self.signed { self.width } else { MAX_WIDTH };
    Self { value: shift_right_round(self.value, width, n, mode), ..self }
  }
}
