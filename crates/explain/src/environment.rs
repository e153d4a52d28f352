//! Environment extraction: one token per contributing `(center, radius)`.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use toolkit::{AtomIdx, AtomMarkers, Fragment, MolecularToolkit, Occurrence, ToolkitError};

use crate::config::TraceConfig;
use crate::token::format_token;

/// `center -> (radius -> token)`, rebuilt for every call.
pub type PerCenterMap = BTreeMap<AtomIdx, BTreeMap<u32, String>>;

/// The subset of [`TraceConfig`] the extractor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentOptions {
    pub radius: u32,
    pub isomeric: bool,
    pub kekulize: bool,
    pub include_radius_tag: bool,
    pub mark_root: bool,
}

impl From<&TraceConfig> for EnvironmentOptions {
    fn from(cfg: &TraceConfig) -> Self {
        Self {
            radius: cfg.radius,
            isomeric: cfg.isomeric,
            kekulize: cfg.kekulize,
            include_radius_tag: cfg.include_radius_tag,
            mark_root: cfg.mark_root,
        }
    }
}

/// Result of [`extract_environments`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub per_center: PerCenterMap,
    /// Occurrences reported by the toolkit within the radius bound.
    pub occurrences: usize,
    /// Occurrences dropped because their environment could not be serialized.
    pub skipped: usize,
}

impl Extraction {
    /// Number of tokens placed in the per-center map.
    pub fn token_count(&self) -> usize {
        self.per_center.values().map(BTreeMap::len).sum()
    }
}

/// Turn toolkit occurrence data into the per-center token map.
///
/// Never fails. Kekulization and occurrence-enumeration failures are logged
/// and the call continues with what it has; an environment whose bonds or
/// text cannot be obtained is skipped and counted in
/// [`Extraction::skipped`].
pub fn extract_environments<T: MolecularToolkit>(
    toolkit: &T,
    mol: &T::Molecule,
    opts: &EnvironmentOptions,
) -> Extraction {
    let working: Cow<'_, T::Molecule> = if opts.kekulize {
        let mut copy = mol.clone();
        if let Err(err) = toolkit.kekulize(&mut copy) {
            warn!(error = %err, "kekulize_failed");
        }
        Cow::Owned(copy)
    } else {
        Cow::Borrowed(mol)
    };
    let mol = working.as_ref();

    let occurrences: BTreeSet<Occurrence> =
        match toolkit.environment_occurrences(mol, opts.radius, opts.isomeric) {
            Ok(found) => found
                .into_iter()
                .filter(|occ| occ.radius <= opts.radius)
                .collect(),
            Err(err) => {
                warn!(error = %err, radius = opts.radius, "environment_occurrences_failed");
                BTreeSet::new()
            }
        };

    let mut extraction = Extraction {
        occurrences: occurrences.len(),
        ..Extraction::default()
    };
    for occ in occurrences {
        match environment_token(toolkit, mol, occ, opts) {
            Ok(token) => {
                extraction
                    .per_center
                    .entry(occ.center)
                    .or_default()
                    .insert(occ.radius, token);
            }
            Err(err) => {
                warn!(
                    center = occ.center,
                    radius = occ.radius,
                    error = %err,
                    "environment_skipped"
                );
                extraction.skipped += 1;
            }
        }
    }

    debug!(
        occurrences = extraction.occurrences,
        centers = extraction.per_center.len(),
        skipped = extraction.skipped,
        "environments_extracted"
    );
    extraction
}

fn environment_token<T: MolecularToolkit>(
    toolkit: &T,
    mol: &T::Molecule,
    occ: Occurrence,
    opts: &EnvironmentOptions,
) -> Result<String, ToolkitError> {
    let bonds = toolkit.environment_bonds(mol, occ.radius, occ.center)?;

    // Radius 0 has no bonds, so the center is always added explicitly.
    let mut atoms: BTreeSet<AtomIdx> = BTreeSet::from([occ.center]);
    for &bond in &bonds {
        let (begin, end) = toolkit.bond_endpoints(mol, bond)?;
        atoms.insert(begin);
        atoms.insert(end);
    }
    let atoms: Vec<AtomIdx> = atoms.into_iter().collect();

    let markers = if opts.mark_root {
        AtomMarkers::root(occ.center)
    } else {
        AtomMarkers::Preserve
    };
    let fragment = Fragment {
        atoms: &atoms,
        bonds: &bonds,
        isomeric: opts.isomeric,
        markers: &markers,
    };
    let text = toolkit.serialize_substructure(mol, &fragment)?;
    Ok(format_token(occ.radius, &text, opts.include_radius_tag))
}
