use tracing::warn;

use toolkit::MolecularToolkit;

/// Fingerprint as one byte per bit (0 or 1), exactly `nbits` long.
///
/// Any toolkit failure yields all zeros. A toolkit returning a different
/// length is truncated or zero-padded to `nbits`.
pub fn encode_fingerprint<T: MolecularToolkit>(
    toolkit: &T,
    mol: &T::Molecule,
    radius: u32,
    nbits: usize,
    isomeric: bool,
) -> Vec<u8> {
    let mut out = vec![0u8; nbits];
    match toolkit.fingerprint_bits(mol, radius, nbits, isomeric) {
        Ok(bits) => {
            for (slot, bit) in out.iter_mut().zip(bits) {
                *slot = u8::from(bit);
            }
        }
        Err(err) => {
            warn!(error = %err, radius, nbits, "fingerprint_fallback");
        }
    }
    out
}

/// Number of set bytes in an encoded fingerprint.
pub fn count_set_bits(fingerprint: &[u8]) -> usize {
    fingerprint.iter().filter(|&&b| b != 0).count()
}
