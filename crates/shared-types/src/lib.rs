//! # Shared Types Crate
//!
//! Records, enums and the time source shared by the pipeline, the queue and
//! the runtime.
//!
//! ## Design Principles
//!
//! - **Typed references**: queue records point at other rows through
//!   `ObjectRef` (kind + id), never through bare integers.
//! - **Typed search**: every record kind has its own `Field` enum, so a
//!   store cannot be asked for a column the record does not have.
//! - **Injected time**: scheduling reads `TimeSource`, never the system clock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod errors;
pub mod record;
pub mod time;

pub use entities::*;
pub use errors::StoreError;
pub use record::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
