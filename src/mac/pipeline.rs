use super::*;
use super::width::check_count;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Most register stages any one part of a pipeline may have.
pub const MAX_REGISTERS: u32 = 1024;

/// The register stages of one multiply-accumulate datapath.
///
/// The total latency is computed once, at construction, and the descriptor is immutable
/// afterwards; both lanes of a complex unit share the same descriptor, so they stay aligned.
///
/// ```
/// # use soft_cmac::PipelineDescriptor;
/// let pipeline = PipelineDescriptor::new(1, 2, 1).unwrap();
/// assert_eq!(pipeline.total_latency(), 4);
/// assert!(PipelineDescriptor::new(u32::MAX, 2, 1).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq, Hash)]
pub struct PipelineDescriptor {
  num_input_registers: u32,
  strategy_internal_latency: u32,
  num_output_registers: u32,
  total_latency: u32,
}

impl PipelineDescriptor {
  /// Fails if any part has more than [`MAX_REGISTERS`] stages.
  pub fn new(
    num_input_registers: u32,
    strategy_internal_latency: u32,
    num_output_registers: u32,
  ) -> Result<Self, ConfigurationError> {
    check_count("input registers", num_input_registers, MAX_REGISTERS)?;
    check_count("internal stages", strategy_internal_latency, MAX_REGISTERS)?;
    check_count("output registers", num_output_registers, MAX_REGISTERS)?;
    Ok(Self {
      num_input_registers,
      strategy_internal_latency,
      num_output_registers,
      total_latency: num_input_registers + strategy_internal_latency + num_output_registers,
    })
  }

  pub const fn num_input_registers(&self) -> u32 { self.num_input_registers }

  pub const fn strategy_internal_latency(&self) -> u32 { self.strategy_internal_latency }

  pub const fn num_output_registers(&self) -> u32 { self.num_output_registers }

  /// Cycles from a [`MacInput`](super::MacInput) entering the unit to its result leaving it.
  pub const fn total_latency(&self) -> u32 { self.total_latency }
}

/// The outcome of aligning a set of parallel paths: their common latency, and how many delay
/// stages each path needs to reach it.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq, Hash)]
pub struct Alignment {
  pub latency: u32,
  pub padding: Vec<u32>,
}

/// Pad every path in `paths` (given by latency) up to the slowest one.
///
/// ```
/// # use soft_cmac::align;
/// let alignment = align(&[3, 1, 2]);
/// assert_eq!(alignment.latency, 3);
/// assert_eq!(alignment.padding, [0, 2, 1]);
/// ```
pub fn align(paths: &[u32]) -> Alignment {
  let latency = paths.iter().copied().max().unwrap_or(0);
  let padding = paths.iter().map(|&path| latency - path).collect();
  Alignment { latency, padding }
}

/// A shift register of `length` stages: what goes in comes out `length` calls to
/// [`shift`](Self::shift) later. A length of 0 passes values straight through.
///
/// ```
/// # use soft_cmac::DelayLine;
/// let mut line = DelayLine::new(2, 0);
/// assert_eq!(line.shift(1), 0);
/// assert_eq!(line.shift(2), 0);
/// assert_eq!(line.shift(3), 1);
/// ```
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub struct DelayLine<T> {
  stages: VecDeque<T>,
}

impl<T: Clone> DelayLine<T> {
  /// A delay line of `length` stages, all initially holding `fill`.
  pub fn new(length: u32, fill: T) -> Self {
    Self { stages: core::iter::repeat_n(fill, length as usize).collect() }
  }

  pub fn len(&self) -> u32 { self.stages.len() as u32 }

  pub fn is_empty(&self) -> bool { self.stages.is_empty() }

  /// Push `input` in and return the value leaving the last stage.
  pub fn shift(&mut self, input: T) -> T {
    match self.stages.pop_front() {
      Some(output) => {
        self.stages.push_back(input);
        output
      }
      None => input,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mac::Strategy;
  use proptest::prelude::*;

  #[test]
  fn descriptor() {
    let strategy = Strategy::ThreeMultiplier;
    let pipeline = PipelineDescriptor::new(1, strategy.internal_latency(), 1).unwrap();
    assert_eq!(pipeline.total_latency(), 4);
    assert_eq!(PipelineDescriptor::new(0, 1, 0).unwrap().total_latency(), 1);
  }

  #[test]
  fn register_counts_are_bounded() {
    let deepest = PipelineDescriptor::new(MAX_REGISTERS, MAX_REGISTERS, MAX_REGISTERS).unwrap();
    assert_eq!(deepest.total_latency(), 3 * MAX_REGISTERS);
    assert_eq!(
      PipelineDescriptor::new(u32::MAX, 1, u32::MAX).err(),
      Some(ConfigurationError::TooLarge { what: "input registers", value: u32::MAX, max: MAX_REGISTERS }),
    );
    assert_eq!(
      PipelineDescriptor::new(0, 1, MAX_REGISTERS + 1).err(),
      Some(ConfigurationError::TooLarge { what: "output registers", value: MAX_REGISTERS + 1, max: MAX_REGISTERS }),
    );
  }

  #[test]
  fn align_nothing() {
    assert_eq!(align(&[]), Alignment::default());
    assert_eq!(align(&[5]), Alignment { latency: 5, padding: [0].into() });
  }

  #[test]
  fn zero_length_passes_through() {
    let mut line = DelayLine::new(0, 'x');
    assert!(line.is_empty());
    assert_eq!(line.shift('a'), 'a');
    assert_eq!(line.shift('b'), 'b');
  }

  proptest!{
    #[test]
    fn delays_by_length(length in 0 ..= 16_u32, inputs in proptest::collection::vec(any::<i32>(), 0 .. 64)) {
      let mut line = DelayLine::new(length, -1);
      prop_assert_eq!(line.len(), length);
      for (i, &input) in inputs.iter().enumerate() {
        let output = line.shift(input);
        let expected = i.checked_sub(length as usize).map_or(-1, |j| inputs[j]);
        prop_assert_eq!(output, expected);
      }
    }

    #[test]
    fn aligned_paths_are_equal(paths in proptest::collection::vec(0 ..= 100_u32, 1 .. 10)) {
      let alignment = align(&paths);
      for (path, padding) in paths.iter().zip(&alignment.padding) {
        prop_assert_eq!(path + padding, alignment.latency);
      }
      prop_assert!(alignment.padding.contains(&0));
    }
  }
}
