//! Molecular toolkit boundary for circular-fingerprint tracing.
//!
//! The trace stages never touch chemistry directly. Everything they need to
//! know about a molecule comes through [`MolecularToolkit`]: parsing,
//! kekulization, which `(center, radius)` environments contribute to the
//! fingerprint, which bonds each environment covers, how to serialize a
//! fragment, and the raw fingerprint bits.
//!
//! ## What ships here
//!
//! - The trait and the plain data it exchanges ([`Occurrence`], [`Fragment`],
//!   [`AtomMarkers`], [`QueryStructure`], [`BondKind`])
//! - [`GraphToolkit`], a small deterministic implementation over a SMILES
//!   subset, used by the CLI, the benches and the test suites
//!
//! ## Markers without mutation
//!
//! Root marking is expressed as an [`AtomMarkers`] side table handed to
//! [`MolecularToolkit::serialize_substructure`]. Implementations must not
//! write markers back into the molecule, so a failed serialization leaves
//! nothing to restore.
//!
//! ## Determinism
//!
//! Implementations are expected to return identical results for identical
//! inputs on any thread. [`GraphToolkit`] holds no state at all.

use std::collections::BTreeSet;

mod element;
mod environment;
mod error;
mod graph;
mod kekulize;
mod molecule;
mod rings;
mod smiles;
mod types;
mod writer;

pub use crate::element::{atomic_number, symbol};
pub use crate::environment::{morgan_environments, MorganEnvironment};
pub use crate::error::ToolkitError;
pub use crate::graph::GraphToolkit;
pub use crate::molecule::{Atom, Bond, Chirality, Molecule};
pub use crate::rings::{ring_atoms, ring_bonds};
pub use crate::smiles::parse_smiles;
pub use crate::types::{
    AtomIdx, AtomMarkers, BondIdx, BondKind, Fragment, Occurrence, QueryStructure,
};

/// Capabilities the trace pipeline consumes from a molecular toolkit.
pub trait MolecularToolkit: Send + Sync {
    /// Toolkit-owned molecule representation. Cloned once per call when
    /// kekulization needs a working copy.
    type Molecule: Clone + Send + Sync;

    fn parse_molecule(&self, text: &str) -> Result<Self::Molecule, ToolkitError>;

    /// Assign explicit single/double bonds to aromatic systems in place.
    ///
    /// Implementations leave the molecule untouched when they fail.
    fn kekulize(&self, mol: &mut Self::Molecule) -> Result<(), ToolkitError>;

    /// Distinct `(center, radius)` environments contributing to the
    /// fingerprint, each with `radius <= radius`.
    fn environment_occurrences(
        &self,
        mol: &Self::Molecule,
        radius: u32,
        isomeric: bool,
    ) -> Result<BTreeSet<Occurrence>, ToolkitError>;

    /// Bonds covered by the radius-`radius` environment of `center`.
    /// Radius 0 yields an empty list.
    fn environment_bonds(
        &self,
        mol: &Self::Molecule,
        radius: u32,
        center: AtomIdx,
    ) -> Result<Vec<BondIdx>, ToolkitError>;

    fn bond_endpoints(
        &self,
        mol: &Self::Molecule,
        bond: BondIdx,
    ) -> Result<(AtomIdx, AtomIdx), ToolkitError>;

    /// Element symbol used to label per-atom chains.
    fn atom_symbol(&self, mol: &Self::Molecule, atom: AtomIdx) -> Result<String, ToolkitError>;

    /// Canonical text for a fragment, with markers taken from `fragment.markers`.
    fn serialize_substructure(
        &self,
        mol: &Self::Molecule,
        fragment: &Fragment<'_>,
    ) -> Result<String, ToolkitError>;

    /// Re-parse serialized fragment text into its structural facts.
    fn parse_query(&self, text: &str) -> Result<QueryStructure, ToolkitError>;

    /// Folded fingerprint of exactly `nbits` bits.
    fn fingerprint_bits(
        &self,
        mol: &Self::Molecule,
        radius: u32,
        nbits: usize,
        isomeric: bool,
    ) -> Result<Vec<bool>, ToolkitError>;
}
