//! Ring membership.

use std::collections::VecDeque;

use crate::molecule::Molecule;
use crate::types::BondIdx;

/// `true` for every bond whose endpoints stay connected once it is removed.
pub fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    (0..mol.bond_count())
        .map(|b| connected_without(mol, b))
        .collect()
}

/// `true` for every atom touching at least one ring bond.
pub fn ring_atoms(mol: &Molecule) -> Vec<bool> {
    let in_ring = ring_bonds(mol);
    let mut atoms = vec![false; mol.atom_count()];
    for (bond, _) in mol.bonds().iter().zip(&in_ring).filter(|(_, &r)| r) {
        atoms[bond.begin] = true;
        atoms[bond.end] = true;
    }
    atoms
}

fn connected_without(mol: &Molecule, removed: BondIdx) -> bool {
    let bond = &mol.bonds()[removed];
    let (start, goal) = (bond.begin, bond.end);
    let mut seen = vec![false; mol.atom_count()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(atom) = queue.pop_front() {
        for &(next, via) in mol.neighbors(atom) {
            if via == removed || seen[next] {
                continue;
            }
            if next == goal {
                return true;
            }
            seen[next] = true;
            queue.push_back(next);
        }
    }
    false
}
