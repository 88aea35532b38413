use super::*;

/// The saturation unit: resize the signed `in_width`-bit `value` down to `out_width` bits.
///
/// Returns the resized value and an overflow flag. The flag is set iff `value` does not fit in
/// `out_width` bits, that is, iff the dropped msbs are not all copies of the retained sign bit. On
/// overflow the result is either the low `out_width` bits of `value` (wrap), or with `clip`, the
/// most positive / most negative representable value according to the sign of `value`.
///
/// Resizing to an equal or wider width never overflows and returns `value` unchanged.
///
/// # Example
///
/// ```
/// # use soft_cmac::resize_clip;
/// assert_eq!(resize_clip(300, 16, 8, false), (44, true));
/// assert_eq!(resize_clip(300, 16, 8, true), (127, true));
/// assert_eq!(resize_clip(-300, 16, 8, true), (-128, true));
/// assert_eq!(resize_clip(-100, 16, 8, true), (-100, false));
/// ```
pub fn resize_clip(value: i128, in_width: u32, out_width: u32, clip: bool) -> (i128, bool) {
  debug_assert!(value.fits_signed(in_width), "{value} does not fit in {in_width} bits");
  if out_width >= in_width { return (value, false) }

  let (wrapped, overflow) = crate::underlying::resize(value, out_width);
  match (overflow, clip) {
    (true, true) if value >= 0 => (signed_max(out_width), true),
    (true, true) => (signed_min(out_width), true),
    _ => (wrapped, overflow),
  }
}

impl Fixed {
  /// Apply the saturation unit to `self`; see [`resize_clip`]. A detected overflow is ORed into
  /// the `overflow` flag; the other flags are kept.
  ///
  /// ```
  /// # use soft_cmac::Fixed;
  /// let x = Fixed::new(-40000, 18).unwrap().resize_clip(16, true);
  /// assert_eq!(x.value(), -32768);
  /// assert!(x.overflow);
  /// ```
  pub fn resize_clip(self, width: u32, clip: bool) -> Self {
    let width = width.clamp(1, MAX_WIDTH);
    if !self.signed {
      // Give unsigned values their sign bit first.
      return self.resize(self.width + 1).resize_clip(width, clip)
    }
    let (value, overflow) = resize_clip(self.value, self.width, width, clip);
    Self { value, width, overflow: self.overflow | overflow, ..self }
  }
}
