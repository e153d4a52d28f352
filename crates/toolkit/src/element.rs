//! Element symbols and default valences.

/// Symbols for elements 1 (H) through 54 (Xe), indexed by `atomic_number - 1`.
static SYMBOLS: [&str; 54] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe",
];

/// Element symbol for an atomic number, if known.
pub fn symbol(atomic_number: u8) -> Option<&'static str> {
    let idx = usize::from(atomic_number).checked_sub(1)?;
    SYMBOLS.get(idx).copied()
}

/// Atomic number for a case-sensitive element symbol.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .and_then(|idx| u8::try_from(idx + 1).ok())
}

/// Allowed valences for the SMILES organic subset, lowest first.
pub(crate) fn allowed_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        _ => &[],
    }
}

/// Elements allowed as aromatic lowercase symbols outside brackets.
pub(crate) fn is_aromatic_organic(atomic_number: u8) -> bool {
    matches!(atomic_number, 5 | 6 | 7 | 8 | 15 | 16)
}
