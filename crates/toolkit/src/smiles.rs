//! SMILES reader, plus the query dialect emitted by [`crate::writer`].
//!
//! The reader covers the organic subset, bracket atoms, explicit bonds,
//! branches, ring closures and `.` disconnections. Aromaticity is taken as
//! written; nothing is perceived. The query dialect additionally accepts
//! `#<Z>` atomic-number primitives inside brackets and skips implicit
//! hydrogen assignment.

use std::collections::BTreeMap;

use crate::element;
use crate::error::ToolkitError;
use crate::molecule::{Atom, Bond, Chirality, Molecule};
use crate::types::{AtomIdx, BondKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Smiles,
    Query,
}

/// Parse SMILES text into a [`Molecule`]. Empty text yields an empty molecule.
pub fn parse_smiles(text: &str) -> Result<Molecule, ToolkitError> {
    Parser::new(text, Dialect::Smiles).run()
}

/// Parse serialized substructure text (or plain SMILES) as a query graph.
pub fn parse_query(text: &str) -> Result<Molecule, ToolkitError> {
    Parser::new(text, Dialect::Query).run()
}

struct OpenRing {
    atom: AtomIdx,
    kind: Option<BondKind>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    dialect: Dialect,
    atoms: Vec<Atom>,
    /// Bracket atoms declare their hydrogens explicitly.
    bracketed: Vec<bool>,
    bonds: Vec<Bond>,
    open_rings: BTreeMap<u16, OpenRing>,
    branches: Vec<AtomIdx>,
    prev: Option<AtomIdx>,
    pending: Option<BondKind>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, dialect: Dialect) -> Self {
        Self {
            input: text.as_bytes(),
            pos: 0,
            dialect,
            atoms: Vec::new(),
            bracketed: Vec::new(),
            bonds: Vec::new(),
            open_rings: BTreeMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, message: impl Into<String>) -> ToolkitError {
        ToolkitError::parse(self.pos, message)
    }

    fn run(mut self) -> Result<Molecule, ToolkitError> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(self.error("branch without preceding atom"));
                    };
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before branch"));
                    }
                    self.advance();
                    self.branches.push(prev);
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(self.error("dangling bond at end of branch"));
                    }
                    let Some(anchor) = self.branches.pop() else {
                        return Err(self.error("unmatched ')'"));
                    };
                    self.advance();
                    self.prev = Some(anchor);
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' => {
                    if self.prev.is_none() {
                        return Err(self.error("bond without preceding atom"));
                    }
                    if self.pending.is_some() {
                        return Err(self.error("consecutive bond symbols"));
                    }
                    self.advance();
                    self.pending = Some(match ch {
                        b'=' => BondKind::Double,
                        b'#' => BondKind::Triple,
                        b':' => BondKind::Aromatic,
                        _ => BondKind::Single,
                    });
                }
                b'%' => {
                    self.advance();
                    let label = self.two_digit_label()?;
                    self.ring_closure(label)?;
                }
                b'0'..=b'9' => {
                    self.advance();
                    self.ring_closure(u16::from(ch - b'0'))?;
                }
                b'[' => self.bracket_atom()?,
                b'.' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.advance();
                    self.prev = None;
                }
                _ if ch.is_ascii_alphabetic() => self.organic_atom()?,
                _ => {
                    return Err(self.error(format!("unexpected character '{}'", ch as char)));
                }
            }
        }

        if self.pending.is_some() {
            return Err(self.error("dangling bond at end of input"));
        }
        if let Some((label, _)) = self.open_rings.iter().next() {
            return Err(self.error(format!("unclosed ring {label}")));
        }
        if !self.branches.is_empty() {
            return Err(self.error(format!("{} unmatched '('", self.branches.len())));
        }

        if self.dialect == Dialect::Smiles {
            self.assign_implicit_hydrogens();
        }
        Molecule::new(self.atoms, self.bonds)
    }

    fn two_digit_label(&mut self) -> Result<u16, ToolkitError> {
        let mut label = 0u16;
        for _ in 0..2 {
            match self.advance() {
                Some(d) if d.is_ascii_digit() => label = label * 10 + u16::from(d - b'0'),
                _ => return Err(self.error("expected two digits after '%'")),
            }
        }
        Ok(label)
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            let digit = u32::from(d - b'0');
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
        }
        value
    }

    fn organic_atom(&mut self) -> Result<(), ToolkitError> {
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Err(self.error("unexpected end of input"));
        };
        let (symbol, aromatic) = match ch {
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                ("Cl", false)
            }
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                ("Br", false)
            }
            b'B' => ("B", false),
            b'C' => ("C", false),
            b'N' => ("N", false),
            b'O' => ("O", false),
            b'P' => ("P", false),
            b'S' => ("S", false),
            b'F' => ("F", false),
            b'I' => ("I", false),
            b'b' => ("B", true),
            b'c' => ("C", true),
            b'n' => ("N", true),
            b'o' => ("O", true),
            b'p' => ("P", true),
            b's' => ("S", true),
            _ => {
                return Err(ToolkitError::parse(
                    start,
                    format!("'{}' is not an organic-subset atom", ch as char),
                ));
            }
        };
        let atomic_number = element::atomic_number(symbol)
            .ok_or_else(|| ToolkitError::parse(start, format!("unknown element '{symbol}'")))?;
        let mut atom = Atom::new(atomic_number);
        atom.aromatic = aromatic;
        self.push_atom(atom, false)
    }

    fn bracket_atom(&mut self) -> Result<(), ToolkitError> {
        self.advance();
        let isotope = match self.number() {
            Some(n) => Some(
                u16::try_from(n).map_err(|_| self.error(format!("isotope {n} out of range")))?,
            ),
            None => None,
        };

        let mut atom = if self.dialect == Dialect::Query && self.peek() == Some(b'#') {
            self.advance();
            let z = self
                .number()
                .ok_or_else(|| self.error("expected atomic number after '#'"))?;
            let z = u8::try_from(z)
                .ok()
                .filter(|&z| z > 0)
                .ok_or_else(|| self.error(format!("atomic number {z} out of range")))?;
            Atom::new(z)
        } else {
            self.bracket_symbol()?
        };
        atom.isotope = isotope;

        if self.peek() == Some(b'@') {
            self.advance();
            atom.chirality = if self.peek() == Some(b'@') {
                self.advance();
                Chirality::Clockwise
            } else {
                Chirality::CounterClockwise
            };
        }

        if self.peek() == Some(b'H') {
            self.advance();
            let count = self.number().unwrap_or(1);
            atom.hydrogens = u8::try_from(count)
                .map_err(|_| self.error(format!("hydrogen count {count} out of range")))?;
        }

        atom.formal_charge = self.charge()?;

        if self.peek() == Some(b':') {
            self.advance();
            atom.map_number = self
                .number()
                .ok_or_else(|| self.error("expected atom-map number after ':'"))?;
        }

        if self.advance() != Some(b']') {
            return Err(self.error("expected ']' to close bracket atom"));
        }
        self.push_atom(atom, true)
    }

    fn bracket_symbol(&mut self) -> Result<Atom, ToolkitError> {
        let start = self.pos;
        let Some(first) = self.advance() else {
            return Err(self.error("unexpected end of input in bracket atom"));
        };
        if first.is_ascii_uppercase() {
            if let Some(second) = self.peek().filter(u8::is_ascii_lowercase) {
                let pair = [first, second];
                let two = std::str::from_utf8(&pair).unwrap_or_default();
                if let Some(z) = element::atomic_number(two) {
                    self.advance();
                    return Ok(Atom::new(z));
                }
            }
            let one = (first as char).to_string();
            let z = element::atomic_number(&one)
                .ok_or_else(|| ToolkitError::parse(start, format!("unknown element '{one}'")))?;
            return Ok(Atom::new(z));
        }
        if first.is_ascii_lowercase() {
            let upper = first.to_ascii_uppercase();
            if let Some(second) = self.peek().filter(|c| matches!(c, b'e' | b's')) {
                let pair = [upper, second];
                let two = std::str::from_utf8(&pair).unwrap_or_default();
                if let Some(z) = element::atomic_number(two).filter(|_| matches!(two, "Se" | "As"))
                {
                    self.advance();
                    let mut atom = Atom::new(z);
                    atom.aromatic = true;
                    return Ok(atom);
                }
            }
            let one = (upper as char).to_string();
            let z = element::atomic_number(&one)
                .filter(|&z| element::is_aromatic_organic(z))
                .ok_or_else(|| {
                    ToolkitError::parse(start, format!("'{}' cannot be aromatic", first as char))
                })?;
            let mut atom = Atom::new(z);
            atom.aromatic = true;
            return Ok(atom);
        }
        Err(ToolkitError::parse(
            start,
            format!("unexpected character '{}' in bracket atom", first as char),
        ))
    }

    fn charge(&mut self) -> Result<i8, ToolkitError> {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = self.peek();
        self.advance();
        if let Some(n) = self.number() {
            let magnitude =
                i8::try_from(n).map_err(|_| self.error(format!("charge {n} out of range")))?;
            return Ok(sign * magnitude);
        }
        let mut magnitude: i8 = 1;
        while self.peek() == symbol {
            self.advance();
            magnitude = magnitude.saturating_add(1);
        }
        Ok(sign * magnitude)
    }

    fn push_atom(&mut self, atom: Atom, bracketed: bool) -> Result<(), ToolkitError> {
        let idx = self.atoms.len();
        let aromatic = atom.aromatic;
        self.atoms.push(atom);
        self.bracketed.push(bracketed);
        if let Some(prev) = self.prev {
            let kind = self.pending.take().unwrap_or_else(|| {
                if aromatic && self.atoms[prev].aromatic {
                    BondKind::Aromatic
                } else {
                    BondKind::Single
                }
            });
            self.bonds.push(Bond {
                begin: prev,
                end: idx,
                kind,
            });
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_closure(&mut self, label: u16) -> Result<(), ToolkitError> {
        let Some(current) = self.prev else {
            return Err(self.error("ring closure without preceding atom"));
        };
        let pending = self.pending.take();
        let Some(open) = self.open_rings.remove(&label) else {
            self.open_rings.insert(
                label,
                OpenRing {
                    atom: current,
                    kind: pending,
                },
            );
            return Ok(());
        };

        if open.atom == current {
            return Err(self.error(format!("ring {label} closes on its own atom")));
        }
        let duplicate = self.bonds.iter().any(|b| {
            (b.begin == open.atom && b.end == current) || (b.begin == current && b.end == open.atom)
        });
        if duplicate {
            return Err(self.error(format!("ring {label} duplicates an existing bond")));
        }
        let kind = match (open.kind, pending) {
            (Some(a), Some(b)) if a != b => {
                return Err(self.error(format!("conflicting bond symbols on ring {label}")));
            }
            (Some(kind), _) | (None, Some(kind)) => kind,
            (None, None) => {
                if self.atoms[open.atom].aromatic && self.atoms[current].aromatic {
                    BondKind::Aromatic
                } else {
                    BondKind::Single
                }
            }
        };
        self.bonds.push(Bond {
            begin: open.atom,
            end: current,
            kind,
        });
        Ok(())
    }

    fn assign_implicit_hydrogens(&mut self) {
        let mut degree = vec![0u8; self.atoms.len()];
        let mut valence = vec![0u8; self.atoms.len()];
        for bond in &self.bonds {
            for end in [bond.begin, bond.end] {
                degree[end] = degree[end].saturating_add(1);
                valence[end] = valence[end].saturating_add(bond.kind.valence());
            }
        }
        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            if self.bracketed[idx] {
                continue;
            }
            // Aromatic atoms donate one electron to the pi system.
            let used = if atom.aromatic {
                degree[idx].saturating_add(1)
            } else {
                valence[idx]
            };
            let target = element::allowed_valences(atom.atomic_number)
                .iter()
                .copied()
                .find(|&v| v >= used);
            atom.hydrogens = target.map_or(0, |t| t - used);
        }
    }
}
