//! Circular (Morgan) environments and their folded bit vector.
//!
//! Each atom starts from a hash of its local invariants. Every round folds
//! in the sorted `(bond, neighbor identifier)` pairs of the previous round,
//! widening the environment by one bond layer. Environments that cover the
//! same bond set as an earlier one are redundant and dropped; atoms whose
//! environment stops growing drop out of later rounds.

use std::collections::{BTreeSet, VecDeque};

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::ToolkitError;
use crate::molecule::Molecule;
use crate::rings::ring_atoms;
use crate::types::{AtomIdx, BondIdx, BondKind};

const INVARIANT_SEED: u64 = 0x6563_6670_0000_0000;
const ROUND_SEED: u64 = 0x6563_6670_0000_0001;

/// One surviving environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorganEnvironment {
    pub center: AtomIdx,
    pub radius: u32,
    pub identifier: u64,
    /// Bonds covered by the environment, ascending. Empty at radius 0.
    pub bonds: Vec<BondIdx>,
}

/// Bonds within `radius` bond steps of `center`, ascending.
///
/// These are exactly the bonds incident to atoms at topological distance
/// less than `radius`. Radius 0 yields no bonds.
pub fn environment_bonds(
    mol: &Molecule,
    radius: u32,
    center: AtomIdx,
) -> Result<Vec<BondIdx>, ToolkitError> {
    mol.atom(center)?;
    let mut distance: Vec<Option<u32>> = vec![None; mol.atom_count()];
    distance[center] = Some(0);
    let mut queue = VecDeque::from([center]);
    let mut bonds = BTreeSet::new();

    while let Some(atom) = queue.pop_front() {
        let d = distance[atom].unwrap_or(0);
        if d >= radius {
            continue;
        }
        for &(next, bond) in mol.neighbors(atom) {
            bonds.insert(bond);
            if distance[next].is_none() {
                distance[next] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    Ok(bonds.into_iter().collect())
}

/// Every non-redundant environment up to `radius`, ordered by radius then center.
pub fn morgan_environments(mol: &Molecule, radius: u32, isomeric: bool) -> Vec<MorganEnvironment> {
    let n = mol.atom_count();
    let in_ring = ring_atoms(mol);
    let mut ids: Vec<u64> = (0..n)
        .map(|atom| atom_invariant(mol, atom, in_ring[atom], isomeric))
        .collect();

    let mut found: Vec<MorganEnvironment> = ids
        .iter()
        .enumerate()
        .map(|(center, &identifier)| MorganEnvironment {
            center,
            radius: 0,
            identifier,
            bonds: Vec::new(),
        })
        .collect();

    let mut alive = vec![true; n];
    let mut previous_bonds: Vec<Vec<BondIdx>> = vec![Vec::new(); n];
    let mut seen: BTreeSet<Vec<BondIdx>> = BTreeSet::new();

    for round in 1..=radius {
        let next_ids: Vec<u64> = (0..n)
            .map(|atom| round_identifier(mol, &ids, atom, round))
            .collect();

        let mut candidates: Vec<(Vec<BondIdx>, u64, AtomIdx)> = Vec::new();
        let live: Vec<AtomIdx> = (0..n).filter(|&a| alive[a]).collect();
        for atom in live {
            let bonds = environment_bonds(mol, round, atom).unwrap_or_default();
            if bonds == previous_bonds[atom] {
                alive[atom] = false;
                continue;
            }
            previous_bonds[atom] = bonds.clone();
            candidates.push((bonds, next_ids[atom], atom));
        }
        candidates.sort();

        let mut kept: Vec<MorganEnvironment> = Vec::new();
        for (bonds, identifier, center) in candidates {
            if seen.contains(&bonds) {
                alive[center] = false;
                continue;
            }
            seen.insert(bonds.clone());
            kept.push(MorganEnvironment {
                center,
                radius: round,
                identifier,
                bonds,
            });
        }
        kept.sort_by_key(|env| env.center);
        found.extend(kept);
        ids = next_ids;

        if !alive.iter().any(|&a| a) {
            break;
        }
    }
    found
}

/// Fold every environment identifier into an `nbits`-long bit vector.
pub fn fingerprint_bits(
    mol: &Molecule,
    radius: u32,
    nbits: usize,
    isomeric: bool,
) -> Result<Vec<bool>, ToolkitError> {
    if nbits == 0 {
        return Err(ToolkitError::InvalidLength(nbits));
    }
    let mut bits = vec![false; nbits];
    for env in morgan_environments(mol, radius, isomeric) {
        let slot = (env.identifier % nbits as u64) as usize;
        bits[slot] = true;
    }
    Ok(bits)
}

fn atom_invariant(mol: &Molecule, atom: AtomIdx, in_ring: bool, isomeric: bool) -> u64 {
    let Ok(data) = mol.atom(atom) else {
        return 0;
    };
    let degree = u8::try_from(mol.degree(atom)).unwrap_or(u8::MAX);
    let mut bytes = vec![
        data.atomic_number,
        degree,
        data.hydrogens,
        data.formal_charge.to_le_bytes()[0],
        u8::from(in_ring),
        u8::from(data.aromatic),
    ];
    if isomeric {
        bytes.push(data.chirality.code());
        bytes.extend_from_slice(&data.isotope.unwrap_or(0).to_le_bytes());
    }
    xxh3_64_with_seed(&bytes, INVARIANT_SEED)
}

fn round_identifier(mol: &Molecule, ids: &[u64], atom: AtomIdx, round: u32) -> u64 {
    let mut pairs: Vec<(u8, u64)> = mol
        .neighbors(atom)
        .iter()
        .map(|&(next, bond)| (bond_code(mol.bonds()[bond].kind), ids[next]))
        .collect();
    pairs.sort_unstable();

    let mut bytes = Vec::with_capacity(12 + pairs.len() * 9);
    bytes.extend_from_slice(&ids[atom].to_le_bytes());
    bytes.extend_from_slice(&round.to_le_bytes());
    for (code, id) in pairs {
        bytes.push(code);
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    xxh3_64_with_seed(&bytes, ROUND_SEED)
}

fn bond_code(kind: BondKind) -> u8 {
    match kind {
        BondKind::Single => 1,
        BondKind::Double => 2,
        BondKind::Triple => 3,
        BondKind::Aromatic => 4,
    }
}
