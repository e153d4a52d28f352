//! Plain data exchanged across the toolkit boundary.
//!
//! These types carry no chemistry of their own. They describe what a toolkit
//! reports about a molecule (occurrences, bond kinds, parsed query facts) and
//! what a caller asks it to serialize (a [`Fragment`] plus its marker table).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Index of an atom inside a toolkit molecule.
pub type AtomIdx = usize;

/// Index of a bond inside a toolkit molecule.
pub type BondIdx = usize;

/// One `(center atom, radius)` environment contributing to a circular fingerprint.
///
/// Ordering is by center first, then radius.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Occurrence {
    pub center: AtomIdx,
    pub radius: u32,
}

impl Occurrence {
    pub fn new(center: AtomIdx, radius: u32) -> Self {
        Self { center, radius }
    }
}

/// Bond classification as far as token metrics are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondKind {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondKind {
    /// Double, triple and aromatic bonds count as unsaturation.
    pub fn is_unsaturated(self) -> bool {
        !matches!(self, BondKind::Single)
    }

    /// Explicit SMARTS bond primitive.
    pub fn symbol(self) -> char {
        match self {
            BondKind::Single => '-',
            BondKind::Double => '=',
            BondKind::Triple => '#',
            BondKind::Aromatic => ':',
        }
    }

    /// Contribution to an atom's valence; aromatic bonds count as one sigma bond.
    pub(crate) fn valence(self) -> u8 {
        match self {
            BondKind::Single | BondKind::Aromatic => 1,
            BondKind::Double => 2,
            BondKind::Triple => 3,
        }
    }
}

/// Marker values (atom-map numbers) to emit while serializing a fragment.
///
/// Serialization takes markers from this side table instead of mutating the
/// molecule, so no restore step exists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomMarkers {
    /// Emit whatever marker each atom already carries.
    #[default]
    Preserve,
    /// Emit only the listed markers; every other atom is unmarked.
    Only(BTreeMap<AtomIdx, u32>),
}

impl AtomMarkers {
    /// Marker value distinguishing the root atom of an environment.
    pub const ROOT_MARKER: u32 = 1;

    /// Clear every marker except `center`, which gets [`Self::ROOT_MARKER`].
    pub fn root(center: AtomIdx) -> Self {
        let mut markers = BTreeMap::new();
        markers.insert(center, Self::ROOT_MARKER);
        AtomMarkers::Only(markers)
    }
}

/// A bond-induced substructure to serialize.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    /// Atoms of the fragment, ascending.
    pub atoms: &'a [AtomIdx],
    /// Bonds of the fragment. May be empty for a single-atom fragment.
    pub bonds: &'a [BondIdx],
    /// Emit isotopes and stereo markers.
    pub isomeric: bool,
    pub markers: &'a AtomMarkers,
}

/// Structural facts recovered by re-parsing serialized substructure text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryStructure {
    /// Atomic number per query atom, in parse order.
    pub atomic_numbers: Vec<u8>,
    /// Kind of every query bond, in parse order.
    pub bonds: Vec<BondKind>,
    /// Number of independent rings (cyclomatic number).
    pub ring_count: usize,
}
