// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-glyph seeds for edge coloring.
//!
//! Two policies exist, matching the cost of the coloring heuristic:
//!
//! - [`glyph_seed`] derives every glyph's seed from the global seed and the
//!   glyph index alone. It is used for expensive heuristics, whose glyphs are
//!   colored in parallel.
//! - [`SequentialSeeds`] advances one running seed per glyph. It is used for
//!   cheap heuristics and can only be consumed on one thread, in glyph order.
//!
//! Both produce the same sequence for the same global seed, no matter how many
//! threads the rest of the pipeline uses.

use core::marker::PhantomData;

/// Multiplier of the linear congruential generator.
pub const LCG_MULTIPLIER: u64 = 6364136223846793005;

/// Increment of the linear congruential generator.
pub const LCG_INCREMENT: u64 = 1442695040888963407;

/// The seed of glyph `index` under the independent policy.
///
/// A global seed of `0` turns off randomization: every glyph then gets `0`.
pub fn glyph_seed(global: u64, index: usize) -> u64 {
    let mixed = LCG_MULTIPLIER
        .wrapping_mul(global ^ index as u64)
        .wrapping_add(LCG_INCREMENT);
    mixed * u64::from(global != 0)
}

/// Seeds of consecutive glyphs under the running policy.
///
/// The state is advanced before each glyph, so the first glyph already gets
/// `global * LCG_MULTIPLIER`. The iterator is deliberately neither `Send` nor
/// `Sync`.
#[derive(Clone, Debug)]
pub struct SequentialSeeds {
    state: u64,
    _single_thread: PhantomData<*const ()>,
}

impl SequentialSeeds {
    /// Starts the sequence from the global seed.
    pub fn new(global: u64) -> Self {
        Self {
            state: global,
            _single_thread: PhantomData,
        }
    }
}

impl Iterator for SequentialSeeds {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.state = self.state.wrapping_mul(LCG_MULTIPLIER);
        Some(self.state)
    }
}
