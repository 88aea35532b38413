//! This module and its submodules contain the fixed-point operand types, and the two output-stage
//! units that every multiply-accumulate variant ends with: the *rounding unit* (shift right with
//! a selectable rounding mode) and the *saturation unit* (resize down with optional clipping and
//! an overflow flag).
//!
//! A fixed-point operand is just an integer with a width; the position of the binary point is a
//! convention of the caller and never affects the arithmetic. All widths are runtime values, from
//! 1 up to [`MAX_WIDTH`] bits, so one [`Fixed`] type serves 16-, 18-, 20-, 22-bit (or any other)
//! datapaths alike.

use crate::underlying::{Bits, MAX_WIDTH, signed_max, signed_min};

/// A fixed-point operand: a two's complement (or unsigned) integer of `width` bits, plus the
/// control flags that travel with it through a pipeline.
///
/// The value always fits in `width` bits; constructors refuse values that do not.
///
/// ```
/// # use soft_cmac::Fixed;
/// let x = Fixed::new(-3, 4).unwrap();
/// assert_eq!(x.value(), -3);
/// assert!(Fixed::new(8, 4).is_none());  // 4-bit signed range is -8..=7
/// ```
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct Fixed {
  value: i128,
  width: u32,
  signed: bool,
  /// The operand carries meaningful data this cycle.
  pub valid: bool,
  /// The operand is being reset.
  pub reset: bool,
  /// An earlier stage already overflowed while producing this operand.
  pub overflow: bool,
}

impl Fixed {
  /// A valid signed operand, or `None` if `value` does not fit in `width` bits or `width` is not
  /// in `1 ..= MAX_WIDTH`.
  pub fn new(value: i128, width: u32) -> Option<Self> {
    if !(1 ..= MAX_WIDTH).contains(&width) || !value.fits_signed(width) { return None }
    Some(Self { value, width, signed: true, valid: true, reset: false, overflow: false })
  }

  /// A valid unsigned operand, or `None` if `value` does not fit in `width` bits or `width` is
  /// not in `1 ..= MAX_WIDTH - 1`.
  pub fn new_unsigned(value: i128, width: u32) -> Option<Self> {
    if !(1 .. MAX_WIDTH).contains(&width) || !value.fits_unsigned(width) { return None }
    Some(Self { value, width, signed: false, valid: true, reset: false, overflow: false })
  }

  /// A valid signed operand holding the low `width` bits of `value`, sign-extended. The
  /// `overflow` flag is set if `value` had to be wrapped.
  pub fn wrapping(value: i128, width: u32) -> Self {
    let width = width.clamp(1, MAX_WIDTH);
    let (value, overflow) = crate::underlying::resize(value, width);
    Self { value, width, signed: true, valid: true, reset: false, overflow }
  }

  /// Signed zero of `width` bits, *not* valid.
  pub fn zero(width: u32) -> Self {
    Self { value: 0, width: width.clamp(1, MAX_WIDTH), signed: true, valid: false, reset: false, overflow: false }
  }

  /// The most positive signed value of `width` bits.
  pub fn max_value(width: u32) -> Self {
    Self::wrapping(signed_max(width), width)
  }

  /// The most negative signed value of `width` bits.
  pub fn min_value(width: u32) -> Self {
    Self::wrapping(signed_min(width), width)
  }

  pub const fn value(self) -> i128 { self.value }

  pub const fn width(self) -> u32 { self.width }

  pub const fn is_signed(self) -> bool { self.signed }

  pub const fn with_valid(mut self, valid: bool) -> Self { self.valid = valid; self }

  pub const fn with_reset(mut self, reset: bool) -> Self { self.reset = reset; self }

  pub const fn with_overflow(mut self, overflow: bool) -> Self { self.overflow = overflow; self }

  /// Resize to a signed operand of `width` bits, wrapping. The control flags are kept, and the
  /// `overflow` flag is additionally set if the value did not fit.
  ///
  /// ```
  /// # use soft_cmac::Fixed;
  /// let x = Fixed::new_unsigned(200, 8).unwrap().resize(8);
  /// assert_eq!(x.value(), -56);
  /// assert!(x.overflow);
  /// ```
  pub fn resize(self, width: u32) -> Self {
    let width = width.clamp(1, MAX_WIDTH);
    let (value, overflow) = crate::underlying::resize(self.value, width);
    Self { value, width, signed: true, overflow: self.overflow | overflow, ..self }
  }
}

/// A complex operand: two [`Fixed`] parts of the same width and signedness.
///
/// The control flags are logically shared: the pair is valid only if both parts are, and is in
/// reset (or has overflowed) if either part is.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct ComplexOperand {
  re: Fixed,
  im: Fixed,
}

impl ComplexOperand {
  /// A valid signed complex operand, or `None` if either part does not fit in `width` bits.
  ///
  /// ```
  /// # use soft_cmac::ComplexOperand;
  /// let z = ComplexOperand::new(3, -4, 8).unwrap();
  /// assert_eq!((z.re().value(), z.im().value()), (3, -4));
  /// ```
  pub fn new(re: i128, im: i128, width: u32) -> Option<Self> {
    Self::from_parts(Fixed::new(re, width)?, Fixed::new(im, width)?)
  }

  /// Pair up two parts, or `None` if their widths or signedness differ.
  pub fn from_parts(re: Fixed, im: Fixed) -> Option<Self> {
    (re.width == im.width && re.signed == im.signed).then_some(Self { re, im })
  }

  /// Both parts wrapped to signed `width` bits; see [`Fixed::wrapping`].
  pub fn wrapping(re: i128, im: i128, width: u32) -> Self {
    Self { re: Fixed::wrapping(re, width), im: Fixed::wrapping(im, width) }
  }

  /// Signed complex zero of `width` bits, *not* valid.
  pub fn zero(width: u32) -> Self {
    Self { re: Fixed::zero(width), im: Fixed::zero(width) }
  }

  pub const fn re(&self) -> Fixed { self.re }

  pub const fn im(&self) -> Fixed { self.im }

  pub const fn width(&self) -> u32 { self.re.width }

  /// Valid only if both parts are valid.
  pub const fn valid(&self) -> bool { self.re.valid & self.im.valid }

  /// In reset if either part is.
  pub const fn reset(&self) -> bool { self.re.reset | self.im.reset }

  /// Overflowed if either part has.
  pub const fn overflow(&self) -> bool { self.re.overflow | self.im.overflow }

  pub const fn with_valid(self, valid: bool) -> Self {
    Self { re: self.re.with_valid(valid), im: self.im.with_valid(valid) }
  }

  pub const fn with_reset(self, reset: bool) -> Self {
    Self { re: self.re.with_reset(reset), im: self.im.with_reset(reset) }
  }

  pub const fn with_overflow(self, overflow: bool) -> Self {
    Self { re: self.re.with_overflow(overflow), im: self.im.with_overflow(overflow) }
  }

  /// Resize both parts to signed `width` bits; see [`Fixed::resize`].
  pub fn resize(self, width: u32) -> Self {
    Self { re: self.re.resize(width), im: self.im.resize(width) }
  }
}

/// Shift right with rounding (the *rounding unit*).
pub mod round;

/// Resize down with clipping and overflow detection (the *saturation unit*).
pub mod saturate;

#[cfg(test)]
pub(crate) mod test;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_checks_range() {
    assert!(Fixed::new(7, 4).is_some());
    assert!(Fixed::new(-8, 4).is_some());
    assert!(Fixed::new(8, 4).is_none());
    assert!(Fixed::new(-9, 4).is_none());
    assert!(Fixed::new(0, 0).is_none());
    assert!(Fixed::new(0, 129).is_none());
    assert!(Fixed::new(i128::MIN, 128).is_some());
  }

  #[test]
  fn new_unsigned_checks_range() {
    assert!(Fixed::new_unsigned(15, 4).is_some());
    assert!(Fixed::new_unsigned(16, 4).is_none());
    assert!(Fixed::new_unsigned(-1, 4).is_none());
    assert!(Fixed::new_unsigned(0, 128).is_none());
  }

  #[test]
  fn wrapping_flags_overflow() {
    let x = Fixed::wrapping(0x1ff, 8);
    assert_eq!(x.value(), -1);
    assert!(x.overflow);
    let y = Fixed::wrapping(-1, 8);
    assert_eq!(y.value(), -1);
    assert!(!y.overflow);
  }

  #[test]
  fn bounds() {
    assert_eq!(Fixed::max_value(16).value(), 32767);
    assert_eq!(Fixed::min_value(16).value(), -32768);
  }

  #[test]
  fn resize_keeps_flags() {
    let x = Fixed::new(100, 16).unwrap().with_reset(true).resize(24);
    assert_eq!(x.value(), 100);
    assert_eq!(x.width(), 24);
    assert!(x.reset && x.valid && !x.overflow);
    let y = Fixed::new(1000, 16).unwrap().resize(8);
    assert!(y.overflow);
  }

  #[test]
  fn complex_flags_merge() {
    let z = ComplexOperand::from_parts(
      Fixed::new(1, 8).unwrap(),
      Fixed::new(2, 8).unwrap().with_valid(false).with_overflow(true),
    ).unwrap();
    assert!(!z.valid());
    assert!(z.overflow());
    assert!(!z.reset());
    assert!(ComplexOperand::from_parts(Fixed::new(1, 8).unwrap(), Fixed::new(1, 9).unwrap()).is_none());
    assert!(ComplexOperand::from_parts(Fixed::new(1, 8).unwrap(), Fixed::new_unsigned(1, 8).unwrap()).is_none());
  }
}
