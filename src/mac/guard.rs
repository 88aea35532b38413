/// How many products an accumulator must be able to sum without overflow (`NUM_SUMMAND`).
///
///   - `0`: unbounded, i.e. "as many as the hardware accumulator allows". The caller then has to
///     name that accumulator width explicitly.
///   - `1`: a single product, no accumulation.
///   - `n > 1`: up to `n` products.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AccumulationDepth(pub u32);

impl AccumulationDepth {
  pub const UNBOUNDED: Self = Self(0);
  pub const SINGLE: Self = Self(1);

  pub const fn is_unbounded(self) -> bool { self.0 == 0 }
}

/// Extra high-order accumulator bits on top of the product width, derived from an
/// [`AccumulationDepth`].
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub enum GuardBits {
  /// Unbounded depth: the width is whatever the surrounding context can afford.
  Unbounded,
  Bits(u32),
}

impl GuardBits {
  /// Summing `n` products can grow the sum by `⌈log2(n)⌉` bits beyond a single product, and one
  /// more bit covers the sign extension of the product itself. So:
  ///
  /// ```
  /// # use soft_cmac::{AccumulationDepth, GuardBits};
  /// assert_eq!(GuardBits::from_depth(AccumulationDepth(0)), GuardBits::Unbounded);
  /// assert_eq!(GuardBits::from_depth(AccumulationDepth(1)), GuardBits::Bits(1));
  /// assert_eq!(GuardBits::from_depth(AccumulationDepth(2)), GuardBits::Bits(2));
  /// assert_eq!(GuardBits::from_depth(AccumulationDepth(4)), GuardBits::Bits(3));
  /// assert_eq!(GuardBits::from_depth(AccumulationDepth(5)), GuardBits::Bits(4));
  /// ```
  pub const fn from_depth(depth: AccumulationDepth) -> Self {
    match depth.0 {
      0 => Self::Unbounded,
      1 => Self::Bits(1),
      n => Self::Bits(ceil_log2(n) + 1),
    }
  }

  /// The guard bits as the integer HDL parameter, with `-1` standing for [`Self::Unbounded`].
  pub const fn as_i32(self) -> i32 {
    match self {
      Self::Unbounded => -1,
      Self::Bits(bits) => bits as i32,
    }
  }

  pub const fn bits(self) -> Option<u32> {
    match self {
      Self::Unbounded => None,
      Self::Bits(bits) => Some(bits),
    }
  }

  /// The largest depth that `bits` guard bits are guaranteed to cover (saturating at
  /// `u32::MAX`); the inverse of [`Self::from_depth`].
  ///
  /// ```
  /// # use soft_cmac::GuardBits;
  /// assert_eq!(GuardBits::max_depth(3), 4);
  /// assert_eq!(GuardBits::max_depth(0), 1);
  /// ```
  pub const fn max_depth(bits: u32) -> u32 {
    match 1_u32.checked_shl(bits.saturating_sub(1)) {
      Some(depth) => depth,
      None => u32::MAX,
    }
  }
}

/// `⌈log2(n)⌉`, for `n ≥ 1`.
const fn ceil_log2(n: u32) -> u32 {
  u32::BITS - (n - 1).leading_zeros()
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn sentinel() {
    assert_eq!(GuardBits::from_depth(AccumulationDepth::UNBOUNDED).as_i32(), -1);
    assert_eq!(GuardBits::from_depth(AccumulationDepth::UNBOUNDED).bits(), None);
    assert_eq!(GuardBits::from_depth(AccumulationDepth::SINGLE).as_i32(), 1);
  }

  #[test]
  fn table() {
    for (depth, bits) in [
      (2, 2), (3, 3), (4, 3), (5, 4), (8, 4), (9, 5), (16, 5), (17, 6), (1024, 11), (1025, 12),
      (u32::MAX, 33),
    ] {
      assert_eq!(GuardBits::from_depth(AccumulationDepth(depth)), GuardBits::Bits(bits), "{depth}");
    }
  }

  proptest!{
    #[test]
    fn ceil_log2_plus_one(n in 2 ..= u32::MAX) {
      // Smallest `k` with 2^k ≥ n, computed the slow way.
      let k = (0 ..= 32).find(|&k| 1_u64 << k >= n as u64).unwrap();
      prop_assert_eq!(GuardBits::from_depth(AccumulationDepth(n)), GuardBits::Bits(k + 1));
    }

    #[test]
    fn max_depth_is_inverse(bits in 1 ..= 32_u32) {
      let depth = GuardBits::max_depth(bits);
      prop_assert_eq!(GuardBits::from_depth(AccumulationDepth(depth)).bits(), Some(bits));
      if depth < u32::MAX {
        prop_assert!(GuardBits::from_depth(AccumulationDepth(depth + 1)).bits() > Some(bits));
      }
    }
  }
}
