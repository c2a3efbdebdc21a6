//! Cross-module tests for the recycling engine
//!
//! End-to-end flows through registry, pools and the prewarm scheduler.

mod scenarios;
mod invariants;
