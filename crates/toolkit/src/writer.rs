//! Deterministic fragment writer.
//!
//! Output is a SMARTS-style query string: every atom is a bracketed
//! atomic-number primitive (`[#6]`), every bond carries an explicit symbol,
//! and markers are emitted as atom-map numbers. The same fragment always
//! produces the same text regardless of input atom order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::error::ToolkitError;
use crate::molecule::{Atom, Chirality, Molecule};
use crate::types::{AtomIdx, AtomMarkers, BondIdx, Fragment};

/// Serialize the bond-induced substructure described by `fragment`.
pub fn write_fragment(mol: &Molecule, fragment: &Fragment<'_>) -> Result<String, ToolkitError> {
    if fragment.atoms.is_empty() {
        return Err(ToolkitError::Serialization("fragment has no atoms".into()));
    }
    let members: BTreeSet<AtomIdx> = fragment.atoms.iter().copied().collect();
    let mut texts: BTreeMap<AtomIdx, String> = BTreeMap::new();
    for &atom in &members {
        let data = mol.atom(atom)?;
        let marker = marker_for(fragment.markers, atom, data);
        texts.insert(atom, atom_text(data, marker, fragment.isomeric));
    }

    let mut adjacency: BTreeMap<AtomIdx, Vec<(AtomIdx, BondIdx)>> =
        members.iter().map(|&a| (a, Vec::new())).collect();
    for &bond_idx in fragment.bonds {
        let bond = mol.bond(bond_idx)?;
        if !members.contains(&bond.begin) || !members.contains(&bond.end) {
            return Err(ToolkitError::Serialization(format!(
                "bond {bond_idx} leaves the fragment"
            )));
        }
        for (from, to) in [(bond.begin, bond.end), (bond.end, bond.begin)] {
            if let Some(list) = adjacency.get_mut(&from) {
                list.push((to, bond_idx));
            }
        }
    }
    for list in adjacency.values_mut() {
        list.sort_by(|&(a, ab), &(b, bb)| {
            let ka = (&texts[&a], bond_symbol(mol, ab), a);
            let kb = (&texts[&b], bond_symbol(mol, bb), b);
            ka.cmp(&kb)
        });
    }

    let marked_root = members
        .iter()
        .copied()
        .find(|&a| mol.atom(a).is_ok_and(|d| marker_for(fragment.markers, a, d) != 0));

    let mut writer = Writer {
        mol,
        texts: &texts,
        adjacency: &adjacency,
        visited: BTreeSet::new(),
        children: BTreeMap::new(),
        opens: BTreeMap::new(),
        closes: BTreeMap::new(),
        classified: BTreeSet::new(),
        digits_in_use: BTreeSet::new(),
        assigned: BTreeMap::new(),
    };

    let mut out = String::new();
    let mut next_start = marked_root;
    while let Some(start) =
        next_start.or_else(|| members.iter().copied().find(|a| !writer.visited.contains(a)))
    {
        if !out.is_empty() {
            out.push('.');
        }
        writer.classify(start, None);
        writer.write(start, &mut out);
        next_start = None;
    }
    Ok(out)
}

fn marker_for(markers: &AtomMarkers, atom: AtomIdx, data: &Atom) -> u32 {
    match markers {
        AtomMarkers::Preserve => data.map_number,
        AtomMarkers::Only(table) => table.get(&atom).copied().unwrap_or(0),
    }
}

fn bond_symbol(mol: &Molecule, bond: BondIdx) -> char {
    mol.bonds()[bond].kind.symbol()
}

fn atom_text(atom: &Atom, marker: u32, isomeric: bool) -> String {
    let mut text = String::from("[");
    if isomeric {
        if let Some(isotope) = atom.isotope {
            let _ = write!(text, "{isotope}");
        }
    }
    let _ = write!(text, "#{}", atom.atomic_number);
    if isomeric {
        match atom.chirality {
            Chirality::None => {}
            Chirality::CounterClockwise => text.push('@'),
            Chirality::Clockwise => text.push_str("@@"),
        }
    }
    match atom.formal_charge {
        0 => {}
        1 => text.push('+'),
        -1 => text.push('-'),
        c if c > 0 => {
            let _ = write!(text, "+{c}");
        }
        c => {
            let _ = write!(text, "-{}", c.unsigned_abs());
        }
    }
    if marker != 0 {
        let _ = write!(text, ":{marker}");
    }
    text.push(']');
    text
}

struct Writer<'m> {
    mol: &'m Molecule,
    texts: &'m BTreeMap<AtomIdx, String>,
    adjacency: &'m BTreeMap<AtomIdx, Vec<(AtomIdx, BondIdx)>>,
    visited: BTreeSet<AtomIdx>,
    children: BTreeMap<AtomIdx, Vec<(AtomIdx, BondIdx)>>,
    /// Ring bonds opened at an atom, in discovery order.
    opens: BTreeMap<AtomIdx, Vec<BondIdx>>,
    /// Ring bonds closed at an atom, in discovery order.
    closes: BTreeMap<AtomIdx, Vec<BondIdx>>,
    classified: BTreeSet<BondIdx>,
    digits_in_use: BTreeSet<u32>,
    assigned: BTreeMap<BondIdx, u32>,
}

impl Writer<'_> {
    /// First pass: split bonds into spanning-tree edges and ring closures.
    fn classify(&mut self, atom: AtomIdx, via: Option<BondIdx>) {
        self.visited.insert(atom);
        let neighbors = self.adjacency.get(&atom).cloned().unwrap_or_default();
        for (next, bond) in neighbors {
            if Some(bond) == via || self.classified.contains(&bond) {
                continue;
            }
            self.classified.insert(bond);
            if self.visited.contains(&next) {
                self.opens.entry(next).or_default().push(bond);
                self.closes.entry(atom).or_default().push(bond);
            } else {
                self.children.entry(atom).or_default().push((next, bond));
                self.classify(next, Some(bond));
            }
        }
    }

    /// Second pass: emit atoms, ring digits and branches.
    fn write(&mut self, atom: AtomIdx, out: &mut String) {
        if let Some(text) = self.texts.get(&atom) {
            out.push_str(text);
        }

        for bond in self.closes.get(&atom).cloned().unwrap_or_default() {
            if let Some(digit) = self.assigned.remove(&bond) {
                self.digits_in_use.remove(&digit);
                push_digit(out, digit);
            }
        }
        for bond in self.opens.get(&atom).cloned().unwrap_or_default() {
            let digit = (1..)
                .find(|d| !self.digits_in_use.contains(d))
                .unwrap_or(1);
            self.digits_in_use.insert(digit);
            self.assigned.insert(bond, digit);
            out.push(bond_symbol(self.mol, bond));
            push_digit(out, digit);
        }

        let children = self.children.get(&atom).cloned().unwrap_or_default();
        let last = children.len().saturating_sub(1);
        for (i, (child, bond)) in children.into_iter().enumerate() {
            let branch = i != last;
            if branch {
                out.push('(');
            }
            out.push(bond_symbol(self.mol, bond));
            self.write(child, out);
            if branch {
                out.push(')');
            }
        }
    }
}

fn push_digit(out: &mut String, digit: u32) {
    if digit < 10 {
        let _ = write!(out, "{digit}");
    } else {
        let _ = write!(out, "%{digit:02}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::environment_bonds;
    use crate::smiles::parse_smiles;

    fn env_text(smiles: &str, center: AtomIdx, radius: u32, markers: AtomMarkers) -> String {
        let mol = parse_smiles(smiles).unwrap();
        let bonds = environment_bonds(&mol, radius, center).unwrap();
        let mut atoms: BTreeSet<AtomIdx> = BTreeSet::from([center]);
        for &b in &bonds {
            atoms.insert(mol.bonds()[b].begin);
            atoms.insert(mol.bonds()[b].end);
        }
        let atoms: Vec<AtomIdx> = atoms.into_iter().collect();
        let fragment = Fragment {
            atoms: &atoms,
            bonds: &bonds,
            isomeric: true,
            markers: &markers,
        };
        write_fragment(&mol, &fragment).unwrap()
    }

    #[test]
    fn single_atom() {
        assert_eq!(env_text("CCO", 2, 0, AtomMarkers::root(2)), "[#8:1]");
        assert_eq!(env_text("CCO", 2, 0, AtomMarkers::Preserve), "[#8]");
    }

    #[test]
    fn branches_sorted_by_neighbor_text() {
        assert_eq!(
            env_text("CCO", 1, 1, AtomMarkers::root(1)),
            "[#6:1](-[#6])-[#8]"
        );
        assert_eq!(env_text("CCO", 0, 1, AtomMarkers::root(0)), "[#6:1]-[#6]");
    }

    #[test]
    fn ring_closure_opens_with_bond_symbol() {
        assert_eq!(
            env_text("C1CC1", 0, 2, AtomMarkers::root(0)),
            "[#6:1]-1-[#6]-[#6]1"
        );
    }

    #[test]
    fn independent_of_atom_order() {
        let a = env_text("OCC", 1, 1, AtomMarkers::root(1));
        let b = env_text("CCO", 1, 1, AtomMarkers::root(1));
        assert_eq!(a, b);
    }

    #[test]
    fn charges_isotopes_and_stereo() {
        assert_eq!(env_text("[13CH3-]", 0, 0, AtomMarkers::Preserve), "[13#6-]");
        assert_eq!(env_text("[NH4+]", 0, 0, AtomMarkers::Preserve), "[#7+]");
        assert_eq!(env_text("[O-2]", 0, 0, AtomMarkers::Preserve), "[#8-2]");
        assert_eq!(
            env_text("F[C@@H](Cl)Br", 1, 0, AtomMarkers::Preserve),
            "[#6@@]"
        );
    }

    #[test]
    fn non_isomeric_drops_isotope_and_stereo() {
        let mol = parse_smiles("[13C@H](F)(Cl)Br").unwrap();
        let atoms = [0];
        let markers = AtomMarkers::Preserve;
        let fragment = Fragment {
            atoms: &atoms,
            bonds: &[],
            isomeric: false,
            markers: &markers,
        };
        assert_eq!(write_fragment(&mol, &fragment).unwrap(), "[#6]");
    }

    #[test]
    fn preserves_existing_map_numbers() {
        assert_eq!(
            env_text("[CH3:5]C", 1, 1, AtomMarkers::Preserve),
            "[#6:5]-[#6]"
        );
    }

    #[test]
    fn rejects_bond_outside_fragment() {
        let mol = parse_smiles("CCO").unwrap();
        let markers = AtomMarkers::Preserve;
        let fragment = Fragment {
            atoms: &[0],
            bonds: &[1],
            isomeric: true,
            markers: &markers,
        };
        assert!(matches!(
            write_fragment(&mol, &fragment),
            Err(ToolkitError::Serialization(_))
        ));
    }

    #[test]
    fn rejects_empty_fragment() {
        let mol = parse_smiles("C").unwrap();
        let markers = AtomMarkers::Preserve;
        let fragment = Fragment {
            atoms: &[],
            bonds: &[],
            isomeric: true,
            markers: &markers,
        };
        assert!(write_fragment(&mol, &fragment).is_err());
    }
}
