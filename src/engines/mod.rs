//! Song engines.
//!
//! This module contains implementations of the lyric-and-audio pipeline.
//!
//! # Available Engines
//!
//! - `serenade` - procedural Malayalam love songs (template lyrics, pentatonic
//!   melody, additive synthesis, WAV output)

pub mod serenade;
