//! Tier resolution and phase-gated admission.

mod evaluator;
mod tier;

pub use evaluator::{evaluate, resolve_tier, DenialReason, Eligibility};
pub use tier::Tier;
