//! DSP Engine — additive voices, crossfade scheduling and the effects chain.
//!
//! The same code runs natively and inside an AudioWorklet via WASM.

pub mod crossfade;
pub mod effects;
pub mod engine;
pub mod eq;
pub mod filter;
pub mod gain;
pub mod oscillator;
pub mod reverb;
pub mod shaper;
pub mod voice;
