//! This module contains the bit-vector primitives the arithmetic core is built from: sign
//! extension, masking, and resize / add / subtract with an overflow flag. They operate on two's
//! complement values held in an `i128`, together with a runtime `width`.
//!
//! A value *of width `w`* is an `i128` whose bits above bit `w-1` are all copies of bit `w-1`
//! (signed), or all zero (unsigned). Every function here is total: widths are clamped to the
//! meaningful range rather than panicking, and callers validate widths at configuration time.

/// The widest value the model can represent, in bits.
pub const MAX_WIDTH: u32 = i128::BITS;

/// Bit-level operations on `i128` values, parameterised by a runtime width.
pub(crate) trait Bits: Copy {
  /// Arithmetic shift right. Shifting by `BITS` or more yields `0` or `-1` (the sign).
  fn asr(self, n: u32) -> Self;

  /// Set all bits more significant than `n` to 0.
  ///
  /// ```ignore
  /// assert_eq!(0xabcd_i128.mask_lsb(4), 0xd)
  /// ```
  fn mask_lsb(self, n: u32) -> Self;

  /// Bit `n` of `self` as a bool (bits past the msb read as the sign).
  fn get_bit(self, n: u32) -> bool;

  /// Keep the low `width` bits and sign-extend from bit `width-1`.
  fn wrap_signed(self, width: u32) -> Self;

  /// Whether `self` is representable as a signed value of `width` bits.
  fn fits_signed(self, width: u32) -> bool;

  /// Whether `self` is representable as an unsigned value of `width` bits.
  fn fits_unsigned(self, width: u32) -> bool;
}

impl Bits for i128 {
  #[inline]
  fn asr(self, n: u32) -> Self {
    self >> n.min(Self::BITS - 1)
  }

  #[inline]
  fn mask_lsb(self, n: u32) -> Self {
    if n >= Self::BITS { return self }
    let mask = (1u128 << n).wrapping_sub(1);
    (self as u128 & mask) as i128
  }

  #[inline]
  fn get_bit(self, n: u32) -> bool {
    self.asr(n) & 1 == 1
  }

  #[inline]
  fn wrap_signed(self, width: u32) -> Self {
    debug_assert!(width >= 1);
    let junk = Self::BITS - width.clamp(1, Self::BITS);
    (self << junk) >> junk
  }

  #[inline]
  fn fits_signed(self, width: u32) -> bool {
    self.wrap_signed(width) == self
  }

  #[inline]
  fn fits_unsigned(self, width: u32) -> bool {
    self >= 0 && (width >= Self::BITS - 1 || self.mask_lsb(width) == self)
  }
}

/// The most negative signed value of `width` bits, `-2^(width-1)`.
pub const fn signed_min(width: u32) -> i128 {
  let width = if width == 0 { 1 } else if width > MAX_WIDTH { MAX_WIDTH } else { width };
  i128::MIN >> (MAX_WIDTH - width)
}

/// The most positive signed value of `width` bits, `2^(width-1) - 1`.
pub const fn signed_max(width: u32) -> i128 {
  let width = if width == 0 { 1 } else if width > MAX_WIDTH { MAX_WIDTH } else { width };
  i128::MAX >> (MAX_WIDTH - width)
}

/// Resize a signed value to `width` bits, wrapping. The flag is set if the value did not fit
/// (i.e. the dropped msbs were not all copies of the new sign bit).
#[inline]
pub(crate) fn resize(value: i128, width: u32) -> (i128, bool) {
  let wrapped = value.wrap_signed(width);
  (wrapped, wrapped != value)
}

/// `a + b`, wrapped to a signed `width`, with an overflow flag.
#[inline]
pub(crate) fn add_overflowing(a: i128, b: i128, width: u32) -> (i128, bool) {
  // A carry out of the `i128` only happens at `width == 128`, where wrapping is exactly what the
  // hardware does; for narrower widths, wrapping modulo 2^128 then 2^width is the same as
  // wrapping modulo 2^width.
  let (sum, carry) = a.overflowing_add(b);
  let (wrapped, overflow) = resize(sum, width);
  (wrapped, overflow | carry)
}

/// `a - b`, wrapped to a signed `width`, with an overflow flag.
#[inline]
pub(crate) fn sub_overflowing(a: i128, b: i128, width: u32) -> (i128, bool) {
  let (diff, borrow) = a.overflowing_sub(b);
  let (wrapped, overflow) = resize(diff, width);
  (wrapped, overflow | borrow)
}
