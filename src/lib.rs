#![cfg_attr(not(test), no_std)]
//! This crate provides a bit-exact software model of fixed-point complex multiply-accumulate
//! (CMAC) units, as they are built from the DSP blocks of FPGAs.
//!
//! # Introduction
//!
//! A complex multiply-accumulate unit computes `acc ← acc ± x·y` on complex fixed-point operands,
//! cycle by cycle, and eventually hands the accumulator to an output stage that drops lsbs (with
//! rounding) and msbs (with saturation or wrapping). Getting such a unit right in hardware means
//! getting a number of small things exactly right:
//!
//!   - how many *guard bits* the accumulator needs so that summing `n` products can never
//!     overflow,
//!   - which *decomposition* of the complex product into real products (four multipliers, three
//!     with a shared temporary product, or two fused dual multipliers) the operand widths and the
//!     requested features allow,
//!   - the *accumulate / clear / hold* behaviour driven by the `clear` and `valid` controls,
//!   - the exact rounding and saturation semantics of the output stage,
//!   - and the *pipeline latency*, so that parallel paths can be aligned.
//!
//! This crate implements all of these, with runtime widths from 1 to [`MAX_WIDTH`] bits. It is
//! meant as a golden model: every result is bit-exact, and every flag (`valid`, `reset`,
//! `overflow`) behaves as the hardware's would. Correctness is ensured via extensive testing
//! against an exact arithmetic oracle.
//!
//! # Usage
//!
//! ```
//! use soft_cmac::{AccumulationDepth, ComplexMac, ComplexOperand, MacConfig, MacInput};
//! use soft_cmac::{OutputPolicy, RoundingMode, Strategy};
//!
//! // 18x18-bit operands, up to 64 accumulated products, 16-bit rounded and clipped output.
//! let config = MacConfig {
//!   x_width: 18,
//!   y_width: 18,
//!   depth: AccumulationDepth(64),
//!   output_width: 16,
//!   rounding: RoundingMode::Nearest,
//!   policy: OutputPolicy { shift_right: 8, clip: true, flag_overflow: true, ..Default::default() },
//!   ..MacConfig::default()
//! };
//! let mut mac = ComplexMac::new(config).unwrap();
//! assert_eq!(mac.strategy(), Strategy::TwoMultiplierFused);
//! assert_eq!(mac.budget().accumulator_width(), 18 + 18 + 1 + 7);
//!
//! // Feed a product in, then wait for it to come out the other end.
//! let x = ComplexOperand::new(1000, -1000, 18).unwrap();
//! let y = ComplexOperand::new(300, 0, 18).unwrap();
//! let mut output = mac.clock(&MacInput::product(true, x, y));
//! for _ in 0 .. mac.pipeline().total_latency() {
//!   output = mac.clock(&MacInput::default());
//! }
//! // 300000 / 256 = 1171.875, rounded to nearest
//! assert_eq!(output.result.re().value(), 1172);
//! assert_eq!(output.result.im().value(), -1172);
//! assert!(output.result.valid() && !output.result.overflow());
//! ```
//!
//! Configuration is where everything that can go wrong goes wrong: an infeasible combination of
//! widths, depth, features, and output policy is rejected by [`ComplexMac::new`] with a
//! [`ConfigurationError`]. Once a unit is built, running it never fails; overflow at run time is
//! reported in the result's `overflow` flag.
//!
//! The building blocks are public too, for when a full unit is more than needed: the rounding
//! unit ([`shift_right_round`]), the saturation unit ([`resize_clip`]), the guard-bit calculator
//! ([`GuardBits::from_depth`]), the width budget ([`WidthBudget`]), the accumulator state machine
//! ([`Accumulator`]), the strategy selector ([`select`]), and the latency accountant
//! ([`PipelineDescriptor`], [`align`], [`DelayLine`]).
//!
//! Configuration types implement `serde`'s `Serialize` and `Deserialize`, with defaults for every
//! field. Configuration decisions are logged with `tracing` at debug level.
//!
//! This crate includes benchmarks; run them with `cargo bench`.

extern crate alloc;

mod error;
mod fixed;
mod mac;
mod underlying;

pub use error::{ConfigurationError, WidthIssue};
pub use fixed::{ComplexOperand, Fixed};
pub use fixed::round::{RoundingMode, shift_right_round};
pub use fixed::saturate::resize_clip;
pub use underlying::{MAX_WIDTH, signed_max, signed_min};

pub use mac::{AccumulationDepth, GuardBits};
pub use mac::{OutputPolicy, WidthBudget};
pub use mac::{Accumulator, AccumulatorState, Action, Summand};
pub use mac::{Capabilities, Features, RoundingStage, Strategy, select};
pub use mac::{Alignment, DelayLine, MAX_REGISTERS, PipelineDescriptor, align};
pub use mac::{ChainValue, ComplexMac, MAX_TERMS, MacConfig, MacInput, MacOutput, Term};
pub use mac::{MAX_STAGES, NetworkConfig, SumNetwork};
