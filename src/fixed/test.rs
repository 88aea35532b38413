use super::*;

use proptest::prelude::*;

impl Fixed {
  /// A [proptest Strategy](proptest::strategy::Strategy) that yields valid signed operands of
  /// exactly `width` bits, anywhere in range.
  pub(crate) fn cases_proptest(width: u32) -> impl Strategy<Value = Self> {
    (signed_min(width) ..= signed_max(width)).prop_map(move |value| Self::wrapping(value, width))
  }
}

impl ComplexOperand {
  /// A [proptest Strategy](proptest::strategy::Strategy) that yields valid signed complex
  /// operands of exactly `width` bits.
  pub(crate) fn cases_proptest(width: u32) -> impl Strategy<Value = Self> {
    (Fixed::cases_proptest(width), Fixed::cases_proptest(width))
      .prop_map(|(re, im)| Self { re, im })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  proptest!{
    #[test]
    fn cases_are_in_range(x in (1 ..= MAX_WIDTH).prop_flat_map(Fixed::cases_proptest)) {
      prop_assert!(x.value().fits_signed(x.width()));
      prop_assert!(x.valid && !x.overflow && !x.reset);
    }
  }
}
