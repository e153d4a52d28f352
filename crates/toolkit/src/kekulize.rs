//! Kekulé assignment for aromatic bonds written in the input.
//!
//! Every aromatic atom that is one bond short of its valence must receive
//! exactly one double bond drawn from its aromatic bonds. That is a maximum
//! matching over the aromatic subgraph, found with augmenting paths. On
//! failure the molecule is left untouched.

use std::collections::VecDeque;

use crate::element;
use crate::error::ToolkitError;
use crate::molecule::Molecule;
use crate::types::{AtomIdx, BondIdx, BondKind};

/// Replace aromatic bonds with alternating single and double bonds.
///
/// Atom aromatic flags are kept. Returns [`ToolkitError::Kekulize`] listing
/// the atoms that could not be matched.
pub fn kekulize(mol: &mut Molecule) -> Result<(), ToolkitError> {
    let n = mol.atom_count();
    let mut aromatic_adj: Vec<Vec<(AtomIdx, BondIdx)>> = vec![Vec::new(); n];
    for (idx, bond) in mol.bonds().iter().enumerate() {
        if bond.kind == BondKind::Aromatic {
            aromatic_adj[bond.begin].push((bond.end, idx));
            aromatic_adj[bond.end].push((bond.begin, idx));
        }
    }

    let needs_double: Vec<bool> = (0..n)
        .map(|atom| !aromatic_adj[atom].is_empty() && needs_double_bond(mol, atom))
        .collect();

    let mut matched: Vec<Option<BondIdx>> = vec![None; n];
    for start in (0..n).filter(|&a| needs_double[a]) {
        if matched[start].is_none() {
            augment(mol, &aromatic_adj, &needs_double, &mut matched, start);
        }
    }

    let unmatched: Vec<AtomIdx> = (0..n)
        .filter(|&a| needs_double[a] && matched[a].is_none())
        .collect();
    if !unmatched.is_empty() {
        return Err(ToolkitError::Kekulize { atoms: unmatched });
    }

    let aromatic_bonds: Vec<BondIdx> = mol
        .bonds()
        .iter()
        .enumerate()
        .filter(|(_, b)| b.kind == BondKind::Aromatic)
        .map(|(idx, _)| idx)
        .collect();
    for bond in aromatic_bonds {
        let kind = if matched.contains(&Some(bond)) {
            BondKind::Double
        } else {
            BondKind::Single
        };
        mol.set_bond_kind(bond, kind);
    }
    Ok(())
}

fn needs_double_bond(mol: &Molecule, atom: AtomIdx) -> bool {
    let Ok(data) = mol.atom(atom) else {
        return false;
    };
    let used = mol.bond_valence(atom).saturating_add(data.hydrogens);
    let charge = i16::from(data.formal_charge);
    let target = element::allowed_valences(data.atomic_number)
        .iter()
        .filter_map(|&v| u8::try_from(i16::from(v) + charge).ok().filter(|&t| t > 0))
        .find(|&t| t >= used);
    target.is_some_and(|t| t - used == 1)
}

fn augment(
    mol: &Molecule,
    aromatic_adj: &[Vec<(AtomIdx, BondIdx)>],
    needs_double: &[bool],
    matched: &mut [Option<BondIdx>],
    start: AtomIdx,
) -> bool {
    let n = mol.atom_count();
    let mut prev: Vec<Option<(AtomIdx, BondIdx)>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(u) = queue.pop_front() {
        for &(v, bond) in &aromatic_adj[u] {
            if !needs_double[v] || visited[v] || matched[u] == Some(bond) {
                continue;
            }
            visited[v] = true;
            prev[v] = Some((u, bond));

            let Some(partner_bond) = matched[v] else {
                flip_path(matched, &prev, start, v);
                return true;
            };
            let Ok(partner) = mol.bond(partner_bond).map(|b| b.other(v)) else {
                continue;
            };
            if !visited[partner] {
                visited[partner] = true;
                prev[partner] = Some((v, partner_bond));
                queue.push_back(partner);
            }
        }
    }
    false
}

fn flip_path(
    matched: &mut [Option<BondIdx>],
    prev: &[Option<(AtomIdx, BondIdx)>],
    start: AtomIdx,
    end: AtomIdx,
) {
    let mut cur = end;
    let mut take = true;
    while cur != start {
        let Some((p, bond)) = prev[cur] else {
            return;
        };
        if take {
            matched[cur] = Some(bond);
            matched[p] = Some(bond);
        }
        take = !take;
        cur = p;
    }
}
