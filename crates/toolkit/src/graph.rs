use std::collections::BTreeSet;

use tracing::debug;

use crate::environment;
use crate::error::ToolkitError;
use crate::kekulize;
use crate::molecule::Molecule;
use crate::smiles;
use crate::types::{AtomIdx, BondIdx, Fragment, Occurrence, QueryStructure};
use crate::writer;
use crate::MolecularToolkit;

/// Lightweight [`MolecularToolkit`] over a plain molecular graph.
///
/// Reads SMILES literally (aromaticity as written, no perception), derives
/// Morgan-style environments with xxh3 identifiers, and writes fragments as
/// SMARTS-like atomic-number queries. Stateless, so one instance can be
/// shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphToolkit;

impl GraphToolkit {
    pub fn new() -> Self {
        Self
    }
}

impl MolecularToolkit for GraphToolkit {
    type Molecule = Molecule;

    fn parse_molecule(&self, text: &str) -> Result<Molecule, ToolkitError> {
        smiles::parse_smiles(text).inspect_err(|err| {
            debug!(error = %err, input_len = text.len(), "parse_molecule_failed");
        })
    }

    fn kekulize(&self, mol: &mut Molecule) -> Result<(), ToolkitError> {
        kekulize::kekulize(mol)
    }

    fn environment_occurrences(
        &self,
        mol: &Molecule,
        radius: u32,
        isomeric: bool,
    ) -> Result<BTreeSet<Occurrence>, ToolkitError> {
        Ok(environment::morgan_environments(mol, radius, isomeric)
            .into_iter()
            .map(|env| Occurrence::new(env.center, env.radius))
            .collect())
    }

    fn environment_bonds(
        &self,
        mol: &Molecule,
        radius: u32,
        center: AtomIdx,
    ) -> Result<Vec<BondIdx>, ToolkitError> {
        environment::environment_bonds(mol, radius, center)
    }

    fn bond_endpoints(
        &self,
        mol: &Molecule,
        bond: BondIdx,
    ) -> Result<(AtomIdx, AtomIdx), ToolkitError> {
        let bond = mol.bond(bond)?;
        Ok((bond.begin, bond.end))
    }

    fn atom_symbol(&self, mol: &Molecule, atom: AtomIdx) -> Result<String, ToolkitError> {
        Ok(mol.atom(atom)?.symbol().to_string())
    }

    fn serialize_substructure(
        &self,
        mol: &Molecule,
        fragment: &Fragment<'_>,
    ) -> Result<String, ToolkitError> {
        writer::write_fragment(mol, fragment)
    }

    fn parse_query(&self, text: &str) -> Result<QueryStructure, ToolkitError> {
        let query = smiles::parse_query(text)?;
        Ok(QueryStructure {
            atomic_numbers: query.atoms().iter().map(|a| a.atomic_number).collect(),
            bonds: query.bonds().iter().map(|b| b.kind).collect(),
            ring_count: query.ring_count(),
        })
    }

    fn fingerprint_bits(
        &self,
        mol: &Molecule,
        radius: u32,
        nbits: usize,
        isomeric: bool,
    ) -> Result<Vec<bool>, ToolkitError> {
        environment::fingerprint_bits(mol, radius, nbits, isomeric)
    }
}
