//! Synthesized percussion voices.
//!
//! Any of these can replace sample slices as the remix sound source: the
//! scheduler triggers one hit per sequence step instead of cutting a slice.
//! Each voice is parametric and ships with a handful of named presets.
//!
//! # Example
//!
//! ```
//! use saavy_remix::graph::{GraphNode, RenderCtx};
//! use saavy_remix::voices::{DrumKind, DrumPatch};
//!
//! let patch = DrumPatch::preset(DrumKind::Kick, "Sonic Boom").unwrap();
//! let mut voice = patch.voice(7);
//! let ctx = RenderCtx::new(48_000.0);
//! voice.note_on(&ctx);
//!
//! let mut block = [0.0f32; 256];
//! voice.render_block(&mut block, &ctx);
//! assert!(block.iter().any(|s| s.abs() > 0.0));
//! ```

mod bass;
mod clap;
mod hihat;
mod kick;
mod snare;

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use bass::{Bass, BassParams, BASS_PRESETS};
pub use clap::{Clap, ClapParams, CLAP_PRESETS};
pub use hihat::{HiHat, HiHatParams, HIHAT_PRESETS};
pub use kick::{Kick, KickParams, KICK_PRESETS};
pub use snare::{Snare, SnareParams, SNARE_PRESETS};

use crate::error::RemixError;
use crate::graph::node::GraphNode;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumKind {
    Kick,
    Snare,
    HiHat,
    Clap,
    Bass,
}

impl DrumKind {
    pub const ALL: [DrumKind; 5] = [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::HiHat,
        DrumKind::Clap,
        DrumKind::Bass,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            DrumKind::Kick => "kick",
            DrumKind::Snare => "snare",
            DrumKind::HiHat => "hihat",
            DrumKind::Clap => "clap",
            DrumKind::Bass => "bass",
        }
    }

    /// Preset names available for this kind, in display order.
    pub fn preset_names(self) -> Vec<&'static str> {
        match self {
            DrumKind::Kick => KICK_PRESETS.iter().map(|(name, _)| *name).collect(),
            DrumKind::Snare => SNARE_PRESETS.iter().map(|(name, _)| *name).collect(),
            DrumKind::HiHat => HIHAT_PRESETS.iter().map(|(name, _)| *name).collect(),
            DrumKind::Clap => CLAP_PRESETS.iter().map(|(name, _)| *name).collect(),
            DrumKind::Bass => BASS_PRESETS.iter().map(|(name, _)| *name).collect(),
        }
    }
}

impl fmt::Display for DrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrumKind {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DrumKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RemixError::UnknownSoundSource(s.to_string()))
    }
}

/// A drum kind together with its parameter values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrumPatch {
    Kick(KickParams),
    Snare(SnareParams),
    HiHat(HiHatParams),
    Clap(ClapParams),
    Bass(BassParams),
}

impl DrumPatch {
    /// Default parameters for `kind`.
    pub fn new(kind: DrumKind) -> Self {
        match kind {
            DrumKind::Kick => DrumPatch::Kick(KickParams::default()),
            DrumKind::Snare => DrumPatch::Snare(SnareParams::default()),
            DrumKind::HiHat => DrumPatch::HiHat(HiHatParams::default()),
            DrumKind::Clap => DrumPatch::Clap(ClapParams::default()),
            DrumKind::Bass => DrumPatch::Bass(BassParams::default()),
        }
    }

    /// Look up a named preset (case-insensitive).
    pub fn preset(kind: DrumKind, name: &str) -> Result<Self, RemixError> {
        fn find<P: Copy>(presets: &[(&str, P)], name: &str) -> Option<P> {
            presets
                .iter()
                .find(|(preset, _)| preset.eq_ignore_ascii_case(name.trim()))
                .map(|(_, params)| *params)
        }

        let patch = match kind {
            DrumKind::Kick => find(&KICK_PRESETS, name).map(DrumPatch::Kick),
            DrumKind::Snare => find(&SNARE_PRESETS, name).map(DrumPatch::Snare),
            DrumKind::HiHat => find(&HIHAT_PRESETS, name).map(DrumPatch::HiHat),
            DrumKind::Clap => find(&CLAP_PRESETS, name).map(DrumPatch::Clap),
            DrumKind::Bass => find(&BASS_PRESETS, name).map(DrumPatch::Bass),
        };
        patch.ok_or_else(|| RemixError::UnknownPreset(format!("{kind}/{name}")))
    }

    pub fn kind(&self) -> DrumKind {
        match self {
            DrumPatch::Kick(_) => DrumKind::Kick,
            DrumPatch::Snare(_) => DrumKind::Snare,
            DrumPatch::HiHat(_) => DrumKind::HiHat,
            DrumPatch::Clap(_) => DrumKind::Clap,
            DrumPatch::Bass(_) => DrumKind::Bass,
        }
    }

    /// Build a fresh, untriggered voice. `seed` drives the noise layers.
    pub fn voice(&self, seed: u64) -> Box<dyn GraphNode> {
        match *self {
            DrumPatch::Kick(params) => Box::new(Kick::new(params, seed)),
            DrumPatch::Snare(params) => Box::new(Snare::new(params, seed)),
            DrumPatch::HiHat(params) => Box::new(HiHat::new(params, seed)),
            DrumPatch::Clap(params) => Box::new(Clap::new(params, seed)),
            DrumPatch::Bass(params) => Box::new(Bass::new(params, seed)),
        }
    }
}
