//! Serenade: a procedural love-song engine.
//!
//! The engine runs two stages. The lyric stage fills verse templates from a
//! lexicon into a [`LyricDocument`](crate::LyricDocument). The audio stage
//! plans a melody from the lyric structure and renders it to a WAV asset.
//!
//! # Pipeline
//!
//! ```text
//! SongLength ──lyrics──▶ LyricDocument ──planner──▶ CompositionPlan
//!                                                      │
//!                                   synth ◀────────────┘
//!                                     │
//!                                     ▼
//!                        samples ──wav──▶ AudioAsset
//! ```
//!
//! # Model Directory Layout
//!
//! ```text
//! models/serenade/
//! └── lexicon.json    # optional; the built-in Malayalam bank is used otherwise
//! ```
//!
//! `lexicon.json` is the serde form of [`Lexicon`]:
//!
//! ```json
//! {
//!   "fragments": { "image": ["നിലാവ്"], "beloved": ["പ്രിയേ"] },
//!   "titles": ["{image} പാടുമ്പോൾ"],
//!   "verses": { "light": [["{beloved}, {image} പോലെ"]] },
//!   "shared_verses": [],
//!   "refrains": ["പ്രണയമേ, വരൂ"],
//!   "outros": ["ഈ രാവ് നമുക്കായ്"]
//! }
//! ```
//!
//! Every mood (`light`, `tender`, `deep`) needs at least one template, either
//! its own or a shared one. Templates have 1 to 4 lines.
//!
//! # Length Policies
//!
//! | Length | Verses | Max duration | Mood |
//! |---|---|---|---|
//! | `short` | 1–2 | 15 s | light |
//! | `medium` | 2–3 | 30 s | tender |
//! | `long` | 3–4 | 55 s | deep |
//!
//! # Examples
//!
//! ```rust,no_run
//! use serenade_rs::{SongEngine, SongLength, engines::serenade::{SerenadeEngine, RenderParamsBuilder}};
//! use std::path::PathBuf;
//!
//! let mut engine = SerenadeEngine::new();
//! engine.load_model(&PathBuf::from("models/serenade"))?;
//!
//! let lyrics = engine.generate_lyrics(SongLength::Long);
//! let params = RenderParamsBuilder::default().sample_rate(44_100).build()?;
//! engine.render_to_file(&lyrics.verses, &PathBuf::from("out.wav"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod lexicon;
pub mod lyrics;
pub mod model;
pub mod planner;
pub mod synth;
pub mod wav;

pub use engine::{RenderParams, RenderParamsBuilder, SerenadeEngine};
pub use lexicon::{Lexicon, Mood};
pub use model::SongModel;
pub use planner::{plan_composition, CompositionPlan};
