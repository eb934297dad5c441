//! Snowflake-style distributed ID generation.
//!
//! A raw ID packs an epoch-relative timestamp, a machine ID and an
//! intra-tick sequence into at most 63 bits, so it is sortable, compact
//! and survives signed 64-bit consumers. The pieces:
//!
//! - [`BitLayout`] — validated field widths, masks and shifts.
//! - [`BasicSnowflakeGenerator`] / [`LockSnowflakeGenerator`] — strictly
//!   monotonic ID production for one machine identity.
//! - [`IdStateCodec`] / [`IdState`] — unpack an ID into inspectable parts
//!   and a fixed-width, lexically sortable friendly string.
//! - [`TimeSource`] / [`SystemClock`] — the injectable clock.
//!
//! Machine-id coordination across a cluster lives in the companion
//! `nivis-machine` crate.
//!
//! # Example
//! ```
//! use nivis::{BitLayout, IdGenerator, IdStateCodec, LockSnowflakeGenerator, SystemClock};
//!
//! let layout = BitLayout::millis();
//! let generator = LockSnowflakeGenerator::new(layout, 7, SystemClock::millis()).unwrap();
//!
//! let id = generator.generate().unwrap();
//! let state = IdStateCodec::new(layout).decode(id);
//! assert_eq!(state.machine_id(), 7);
//! ```

mod base32;
mod error;
mod generator;
mod layout;
mod state;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::state::*;
pub use crate::time::*;
