//! Giveaway lifecycle engine
//!
//! This module provides:
//! - **LifecycleEngine**: start, toggle, end, cancel and reroll operations
//! - **Timers**: one cancellable scheduled resolution per open giveaway
//! - **Errors**: one error type per operation
//!
//! # State machine
//!
//! ```text
//!            start
//!              │
//!              ▼
//!  ┌──────────────────────┐   cancel (host / override)   ┌───────────┐
//!  │         Open         │ ────────────────────────────▶ │ Cancelled │
//!  │  toggles accepted    │                              └───────────┘
//!  └──────────────────────┘
//!              │
//!   timer expiry │ manual end
//!              ▼
//!  ┌──────────────────────┐
//!  │        Ended         │ ◀─┐
//!  │  lastWinners set     │   │ reroll
//!  └──────────────────────┘ ──┘
//! ```
//!
//! Exactly one resolution leaves `Open`. Whichever of the timer or a manual
//! end gets the store entry first wins; the other sees
//! [`Resolution::AlreadyResolved`].

mod error;
mod lifecycle;

#[cfg(test)]
mod lifecycle_tests;

pub use error::{CancelError, EndError, RerollError, StartError};
pub use lifecycle::{EngineBuilder, LifecycleEngine, Resolution};
