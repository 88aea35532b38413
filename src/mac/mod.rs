//! This module and its submodules contain the multiply-accumulate core: everything between the
//! operand registers and the output stage of a complex multiply-accumulate unit.
//!
//! Building a unit is a configuration-time affair. A [`MacConfig`] is checked by the
//! [`WidthBudget`] (how many guard bits the accumulator needs for the requested
//! [`AccumulationDepth`], and whether the output width leaves room for saturation), and by the
//! strategy selector (which decomposition of the complex product into real products can serve
//! the operand widths and [`Features`]). Both must succeed for [`ComplexMac::new`] to succeed, and
//! they fix the [`PipelineDescriptor`] of the unit.
//!
//! At run time, [`ComplexMac::clock`] advances one cycle: the two [`Accumulator`] lanes follow the
//! clear/valid state machine, and the result goes through the rounding and saturation units of
//! [`crate::fixed`].

use crate::error::{ConfigurationError, WidthIssue};
use crate::fixed::ComplexOperand;
use crate::fixed::round::{RoundingMode, shift_right_round};
use crate::fixed::saturate::resize_clip;
use crate::underlying::MAX_WIDTH;

/// Guard bits as a function of the accumulation depth.
mod guard;

/// Derivation and validation of the datapath widths.
mod width;

/// The accumulator lanes and their clear/valid state machine.
mod accumulate;

/// Decomposition strategies and the selector choosing between them.
mod strategy;

/// Latency accounting and delay compensation.
mod pipeline;

/// The complex multiply-accumulate unit.
mod unit;

/// Chains of units summing many products per cycle.
mod network;

pub use accumulate::{Accumulator, AccumulatorState, Action, Summand};
pub use guard::{AccumulationDepth, GuardBits};
pub use network::{MAX_STAGES, NetworkConfig, SumNetwork};
pub use pipeline::{Alignment, DelayLine, MAX_REGISTERS, PipelineDescriptor, align};
pub use strategy::{Capabilities, Features, RoundingStage, Strategy, select};
pub use unit::{ChainValue, ComplexMac, MAX_TERMS, MacConfig, MacInput, MacOutput, Term};
pub use width::{OutputPolicy, WidthBudget};
