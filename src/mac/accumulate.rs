use super::*;
use crate::underlying::{add_overflowing, resize, sub_overflowing};

/// The state of one accumulator lane.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
pub enum AccumulatorState {
  /// Content undefined: nothing has been stored since start-up or the last reset.
  #[default]
  Idle,
  /// Content defined, kept from an earlier cycle.
  Holding,
  /// Content defined, written this cycle.
  Accumulating,
}

/// What the accumulator does in a cycle, decoded from the `clear` and `valid` controls.
///
/// | clear | valid | action       | next stored value   |
/// |-------|-------|--------------|---------------------|
/// | 1     | 0     | `Reset`      | undefined           |
/// | 1     | 1     | `Restart`    | `Σ ±term`           |
/// | 0     | 0     | `Hold`       | unchanged           |
/// | 0     | 1     | `Accumulate` | `stored + Σ ±term`  |
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub enum Action {
  Reset,
  Restart,
  Hold,
  Accumulate,
}

impl Action {
  pub const fn decode(clear: bool, valid: bool) -> Self {
    match (clear, valid) {
      (true, false) => Self::Reset,
      (true, true) => Self::Restart,
      (false, false) => Self::Hold,
      (false, true) => Self::Accumulate,
    }
  }
}

/// One term entering the accumulator: a value, added or (with `negate`) subtracted.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct Summand {
  pub value: i128,
  pub negate: bool,
}

impl Summand {
  pub const fn add(value: i128) -> Self { Self { value, negate: false } }

  pub const fn sub(value: i128) -> Self { Self { value, negate: true } }
}

/// One lane of a multiply-accumulate unit: a `width`-bit register driven by the
/// [clear/valid state machine](Action).
///
/// The sum wraps at `width` bits like the hardware register does; whether it did is kept in a
/// sticky overflow flag that is cleared on the next restart or reset.
///
/// ```
/// # use soft_cmac::{Accumulator, Summand};
/// let mut acc = Accumulator::new(8);
/// acc.clock(true, true, [Summand::add(100)]);
/// acc.clock(false, true, [Summand::sub(30), Summand::add(2)]);
/// assert_eq!(acc.value(), Some(72));
/// acc.clock(false, true, [Summand::add(100)]);
/// assert_eq!(acc.value(), Some(-84));  // 172 wrapped to 8 bits
/// assert!(acc.overflow());
/// ```
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub struct Accumulator {
  width: u32,
  state: AccumulatorState,
  value: i128,
  overflow: bool,
}

impl Accumulator {
  /// A new accumulator of `width` bits, in the [`AccumulatorState::Idle`] state.
  pub fn new(width: u32) -> Self {
    Self { width: width.clamp(1, MAX_WIDTH), state: AccumulatorState::Idle, value: 0, overflow: false }
  }

  /// Advance one cycle. Returns the action taken.
  ///
  /// Accumulating or holding while [`Idle`](AccumulatorState::Idle) leaves the accumulator idle:
  /// there is no defined content to add to.
  pub fn clock(
    &mut self,
    clear: bool,
    valid: bool,
    summands: impl IntoIterator<Item = Summand>,
  ) -> Action {
    let action = Action::decode(clear, valid);
    match action {
      Action::Reset => {
        self.state = AccumulatorState::Idle;
        self.value = 0;
        self.overflow = false;
      }
      Action::Restart => {
        let (value, overflow) = self.sum(0, summands);
        self.value = value;
        self.overflow = overflow;
        self.state = AccumulatorState::Accumulating;
      }
      Action::Hold => {
        if self.state != AccumulatorState::Idle {
          self.state = AccumulatorState::Holding;
        }
      }
      Action::Accumulate => {
        if self.state != AccumulatorState::Idle {
          let (value, overflow) = self.sum(self.value, summands);
          self.value = value;
          self.overflow |= overflow;
          self.state = AccumulatorState::Accumulating;
        }
      }
    }
    action
  }

  /// `start + Σ ±summand`, wrapped to `self.width`, and whether the exact sum did not fit.
  fn sum(&self, start: i128, summands: impl IntoIterator<Item = Summand>) -> (i128, bool) {
    // The running sum lives in an `i128`, which may itself wrap when `width` is close to 128; we
    // count those wraps (signed) so that "the exact sum fits" can still be decided at the end.
    let mut acc = start;
    let mut wraps = 0_i64;
    for Summand { value, negate } in summands {
      let (next, wrapped) = if negate {
        sub_overflowing(acc, value, MAX_WIDTH)
      } else {
        add_overflowing(acc, value, MAX_WIDTH)
      };
      if wrapped {
        // Adding something positive (or subtracting something negative) wraps upwards.
        wraps += if (value >= 0) != negate { 1 } else { -1 };
      }
      acc = next;
    }
    let (value, overflow) = resize(acc, self.width);
    (value, overflow | (wraps != 0))
  }

  /// The stored value, or `None` while [`Idle`](AccumulatorState::Idle).
  pub fn value(&self) -> Option<i128> {
    (self.state != AccumulatorState::Idle).then_some(self.value)
  }

  /// Whether the stored value wrapped since the last restart.
  pub const fn overflow(&self) -> bool { self.overflow }

  pub const fn state(&self) -> AccumulatorState { self.state }

  pub const fn width(&self) -> u32 { self.width }
}
