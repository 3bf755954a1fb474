//! Render pipeline definitions.
//!
//! - `basic` holds the shared pipeline builder and the scene pipeline
//! - `rgb_shift` holds the full screen colour fringing effect

pub mod basic;
pub mod rgb_shift;
