//! Locality matching over a [`SerializedArray`].
//!
//! Resolution runs once per tier, region first. At each tier the selector
//! walks the sibling direction (`i -> 2i + 2`) from the carried index,
//! stopping at the first entry equal to the target's code. If none matches,
//! it falls back to one of the live siblings it passed, picked by a
//! [`SiblingChooser`]. The next tier starts at the chosen entry's first child
//! (`2i + 1`).
//!
//! The selector only reads the array, so any number of selectors may run in
//! parallel over the same snapshot.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::array::{child_of, sibling_of, SerializedArray};
use crate::error::{LocalityError, Result};
use crate::leaf_index::LeafIndex;
use crate::location::{Endpoint, LocationKey, Tier, MAX_CODES};

/// Picks a fallback sibling when a tier has no exact match.
pub trait SiblingChooser {
    /// `codes` are the live siblings at `tier` in chain order, never empty.
    /// Returns a position in `codes`; positions past the end wrap around.
    fn choose(&mut self, tier: Tier, codes: &[u8]) -> usize;
}

impl<C: SiblingChooser + ?Sized> SiblingChooser for &mut C {
    fn choose(&mut self, tier: Tier, codes: &[u8]) -> usize {
        (**self).choose(tier, codes)
    }
}

impl<C: SiblingChooser + ?Sized> SiblingChooser for Box<C> {
    fn choose(&mut self, tier: Tier, codes: &[u8]) -> usize {
        (**self).choose(tier, codes)
    }
}

/// Uniform choice among the candidates.
#[derive(Clone, Debug)]
pub struct RandomChooser<R = StdRng> {
    rng: R,
}

impl RandomChooser<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible choices, for tests and replay.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomChooser<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SiblingChooser for RandomChooser<R> {
    fn choose(&mut self, _tier: Tier, codes: &[u8]) -> usize {
        self.rng.gen_range(0..codes.len())
    }
}

/// Outcome of [`LocalitySelector::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub key: LocationKey,
    /// First tier that fell back to a sibling, if any.
    pub degraded: Option<Tier>,
}

impl Resolution {
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.degraded.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct LocalitySelector<C = RandomChooser> {
    chooser: C,
}

impl LocalitySelector<RandomChooser> {
    pub fn new() -> Self {
        Self::with_chooser(RandomChooser::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_chooser(RandomChooser::seeded(seed))
    }
}

impl Default for LocalitySelector<RandomChooser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SiblingChooser> LocalitySelector<C> {
    pub fn with_chooser(chooser: C) -> Self {
        Self { chooser }
    }

    pub fn chooser_mut(&mut self) -> &mut C {
        &mut self.chooser
    }

    /// Resolve `target` to the closest location present in `array`.
    ///
    /// An exact match at every tier returns `target` itself. Otherwise the
    /// key keeps every matched ancestor and swaps in a sibling at the first
    /// tier that had no match.
    pub fn resolve(&mut self, target: &LocationKey, array: &SerializedArray) -> Result<Resolution> {
        let mut codes = [0u8; 3];
        let mut degraded = None;
        let mut carried: Option<usize> = None;

        for tier in Tier::ALL {
            let start = match carried {
                None => 0,
                Some(i) => child_of(i).ok_or(LocalityError::MalformedArray { tier, index: i })?,
            };
            let (index, code, exact) = self.walk_tier(tier, target.code_at(tier), start, array)?;
            codes[tier.depth()] = code;
            if !exact && degraded.is_none() {
                degraded = Some(tier);
            }
            carried = Some(index);
        }

        // Every code was validated during the walk.
        let key = LocationKey::from_codes(codes).ok_or(LocalityError::MalformedArray {
            tier: Tier::Region,
            index: 0,
        })?;
        Ok(Resolution { key, degraded })
    }

    /// Resolve `target` and return a snapshot of the endpoints at the
    /// resolved key. Narrowing to one endpoint is left to the caller.
    ///
    /// A resolved key with no endpoints in `index` means the array is older
    /// than the index and yields [`LocalityError::UnknownLocationKey`].
    pub fn select(
        &mut self,
        target: &LocationKey,
        array: &SerializedArray,
        index: &LeafIndex,
    ) -> Result<Vec<Endpoint>> {
        let resolution = self.resolve(target, array)?;
        index
            .get(&resolution.key)
            .map(<[Endpoint]>::to_vec)
            .ok_or(LocalityError::UnknownLocationKey(resolution.key))
    }

    /// Returns `(index, code, exact)` for the entry chosen at `tier`.
    fn walk_tier(
        &mut self,
        tier: Tier,
        target: u8,
        start: usize,
        array: &SerializedArray,
    ) -> Result<(usize, u8, bool)> {
        let mut seen: SmallVec<[(usize, u8); MAX_CODES]> = SmallVec::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            let Some(code) = array.get(i) else {
                break;
            };
            if !tier.is_valid_code(code) {
                return Err(LocalityError::MalformedArray { tier, index: i });
            }
            if code == target {
                trace!(%tier, index = i, code, "exact match");
                return Ok((i, code, true));
            }
            seen.push((i, code));
            cursor = sibling_of(i);
        }

        if seen.is_empty() {
            return Err(LocalityError::MalformedArray { tier, index: start });
        }

        let codes: SmallVec<[u8; MAX_CODES]> = seen.iter().map(|&(_, code)| code).collect();
        let pos = self.chooser.choose(tier, &codes) % seen.len();
        let (index, code) = seen[pos];
        debug!(%tier, target, chosen = code, candidates = seen.len(), "degraded match");
        Ok((index, code, false))
    }
}
