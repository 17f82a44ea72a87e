//! The guided "sell my car" questionnaire as a pure state machine.
//!
//! `transition` computes the next per-user session and a list of effects
//! (messages to send, a lead to persist). It performs no I/O; the bot crate
//! executes the effects and owns the persistence ordering.

mod engine;
mod states;

pub use engine::{is_plausible_phone, transition};
pub use states::{SellEffect, SellEvent, SellSession, SellStep};
