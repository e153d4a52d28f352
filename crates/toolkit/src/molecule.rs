//! Molecular graph used by [`crate::GraphToolkit`].

use crate::element;
use crate::error::ToolkitError;
use crate::types::{AtomIdx, BondIdx, BondKind};

/// Tetrahedral chirality marker as written in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

impl Chirality {
    pub(crate) fn code(self) -> u8 {
        match self {
            Chirality::None => 0,
            Chirality::CounterClockwise => 1,
            Chirality::Clockwise => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub aromatic: bool,
    /// Implicit plus bracket-declared hydrogens.
    pub hydrogens: u8,
    pub chirality: Chirality,
    /// Atom-map number, 0 when unset.
    pub map_number: u32,
}

impl Atom {
    pub fn new(atomic_number: u8) -> Self {
        Self {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            aromatic: false,
            hydrogens: 0,
            chirality: Chirality::None,
            map_number: 0,
        }
    }

    /// Element symbol, `*` for atomic numbers outside the table.
    pub fn symbol(&self) -> &'static str {
        element::symbol(self.atomic_number).unwrap_or("*")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bond {
    pub begin: AtomIdx,
    pub end: AtomIdx,
    pub kind: BondKind,
}

impl Bond {
    /// The endpoint opposite `atom`.
    pub fn other(&self, atom: AtomIdx) -> AtomIdx {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// Atoms, bonds and a derived adjacency list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// `adjacency[atom] = [(neighbor, bond)]`, in bond order.
    adjacency: Vec<Vec<(AtomIdx, BondIdx)>>,
}

impl Molecule {
    /// Build a molecule; every bond endpoint must index into `atoms`.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, ToolkitError> {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (idx, bond) in bonds.iter().enumerate() {
            if bond.begin >= atoms.len() {
                return Err(ToolkitError::AtomOutOfRange(bond.begin));
            }
            if bond.end >= atoms.len() {
                return Err(ToolkitError::AtomOutOfRange(bond.end));
            }
            adjacency[bond.begin].push((bond.end, idx));
            adjacency[bond.end].push((bond.begin, idx));
        }
        Ok(Self {
            atoms,
            bonds,
            adjacency,
        })
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atom(&self, idx: AtomIdx) -> Result<&Atom, ToolkitError> {
        self.atoms.get(idx).ok_or(ToolkitError::AtomOutOfRange(idx))
    }

    pub fn bond(&self, idx: BondIdx) -> Result<&Bond, ToolkitError> {
        self.bonds.get(idx).ok_or(ToolkitError::BondOutOfRange(idx))
    }

    /// `(neighbor, bond)` pairs of an atom; empty for an out-of-range index.
    pub fn neighbors(&self, atom: AtomIdx) -> &[(AtomIdx, BondIdx)] {
        self.adjacency.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, atom: AtomIdx) -> usize {
        self.neighbors(atom).len()
    }

    /// Sum of bond valence contributions at `atom`.
    pub fn bond_valence(&self, atom: AtomIdx) -> u8 {
        self.neighbors(atom)
            .iter()
            .map(|&(_, b)| self.bonds[b].kind.valence())
            .sum()
    }

    pub(crate) fn set_bond_kind(&mut self, idx: BondIdx, kind: BondKind) {
        if let Some(bond) = self.bonds.get_mut(idx) {
            bond.kind = kind;
        }
    }

    /// Number of connected components, counting isolated atoms.
    pub fn component_count(&self) -> usize {
        let mut seen = vec![false; self.atoms.len()];
        let mut components = 0;
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            components += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(a) = stack.pop() {
                for &(n, _) in self.neighbors(a) {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        components
    }

    /// Cyclomatic number: independent rings in the bond graph.
    pub fn ring_count(&self) -> usize {
        (self.bonds.len() + self.component_count()).saturating_sub(self.atoms.len())
    }
}
