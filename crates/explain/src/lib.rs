//! Explanation stages for circular molecular fingerprints.
//!
//! Given a molecule held by some [`toolkit::MolecularToolkit`], this crate
//! answers "which environments set which bits?" in plain text:
//!
//! 1. [`extract_environments`] turns each contributing `(center, radius)`
//!    into a canonical token, root-marked through a side table.
//! 2. [`MetricsCache`] memoizes per-token structure facts and defines the
//!    [`ComplexityKey`] order.
//! 3. [`assemble_trace`] folds tokens per radius, ranks them and renders the
//!    summary lines plus optional per-center chains.
//! 4. [`encode_fingerprint`] produces the matching bit vector.
//!
//! ## Degrade, don't abort
//!
//! None of the stages return errors. A token that cannot be serialized is
//! skipped, an unparseable token ranks with zero counts, and a failed
//! fingerprint comes back as zeros. Callers decide what an invalid molecule
//! means; by the time these stages run the molecule has been parsed.
//!
//! ## Determinism
//!
//! Output depends only on the molecule, the toolkit and [`TraceConfig`].
//! Every map is ordered and every sort key is total, so the rendered text is
//! byte-identical across runs and threads.

mod assemble;
mod config;
mod encoder;
mod environment;
mod metrics;
mod token;

pub use crate::assemble::{
    assemble_trace, fold_by_radius, render_chain_lines, render_radius_lines, ByRadiusMap,
    CHAIN_HEADER,
};
pub use crate::config::{
    ConfigError, TraceConfig, DEFAULT_FINGERPRINT_SIZE, DEFAULT_RADIUS, MAX_FINGERPRINT_SIZE,
};
pub use crate::encoder::{count_set_bits, encode_fingerprint};
pub use crate::environment::{extract_environments, EnvironmentOptions, Extraction, PerCenterMap};
pub use crate::metrics::{compute_metrics, ComplexityKey, MetricsCache, TokenMetrics};
pub use crate::token::{format_token, token_radius, token_substructure};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use toolkit::{
        AtomIdx, BondIdx, Fragment, GraphToolkit, Molecule, MolecularToolkit, Occurrence,
        QueryStructure, ToolkitError,
    };

    /// Delegates to [`GraphToolkit`] but fails selected capabilities.
    #[derive(Default)]
    struct FlakyToolkit {
        inner: GraphToolkit,
        fail_serialize_center: Option<AtomIdx>,
        fail_fingerprint: bool,
        fail_queries: bool,
        query_calls: AtomicUsize,
    }

    impl MolecularToolkit for FlakyToolkit {
        type Molecule = Molecule;

        fn parse_molecule(&self, text: &str) -> Result<Molecule, ToolkitError> {
            self.inner.parse_molecule(text)
        }

        fn kekulize(&self, mol: &mut Molecule) -> Result<(), ToolkitError> {
            self.inner.kekulize(mol)
        }

        fn environment_occurrences(
            &self,
            mol: &Molecule,
            radius: u32,
            isomeric: bool,
        ) -> Result<BTreeSet<Occurrence>, ToolkitError> {
            self.inner.environment_occurrences(mol, radius, isomeric)
        }

        fn environment_bonds(
            &self,
            mol: &Molecule,
            radius: u32,
            center: AtomIdx,
        ) -> Result<Vec<BondIdx>, ToolkitError> {
            self.inner.environment_bonds(mol, radius, center)
        }

        fn bond_endpoints(
            &self,
            mol: &Molecule,
            bond: BondIdx,
        ) -> Result<(AtomIdx, AtomIdx), ToolkitError> {
            self.inner.bond_endpoints(mol, bond)
        }

        fn atom_symbol(&self, mol: &Molecule, atom: AtomIdx) -> Result<String, ToolkitError> {
            self.inner.atom_symbol(mol, atom)
        }

        fn serialize_substructure(
            &self,
            mol: &Molecule,
            fragment: &Fragment<'_>,
        ) -> Result<String, ToolkitError> {
            let rooted_at_failing_center = self
                .fail_serialize_center
                .is_some_and(|center| fragment.markers == &toolkit::AtomMarkers::root(center));
            if rooted_at_failing_center {
                return Err(ToolkitError::Serialization("scripted failure".into()));
            }
            self.inner.serialize_substructure(mol, fragment)
        }

        fn parse_query(&self, text: &str) -> Result<QueryStructure, ToolkitError> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_queries {
                return Err(ToolkitError::Parse {
                    position: 0,
                    message: "scripted failure".into(),
                });
            }
            self.inner.parse_query(text)
        }

        fn fingerprint_bits(
            &self,
            mol: &Molecule,
            radius: u32,
            nbits: usize,
            isomeric: bool,
        ) -> Result<Vec<bool>, ToolkitError> {
            if self.fail_fingerprint {
                return Err(ToolkitError::InvalidLength(nbits));
            }
            self.inner.fingerprint_bits(mol, radius, nbits, isomeric)
        }
    }

    fn run(tk: &FlakyToolkit, smiles: &str, cfg: &TraceConfig) -> (Extraction, String) {
        let mol = tk.parse_molecule(smiles).unwrap();
        let extraction = extract_environments(tk, &mol, &EnvironmentOptions::from(cfg));
        let text = assemble_trace(
            tk,
            &MetricsCache::new(),
            &mol,
            &extraction.per_center,
            cfg.include_per_center,
        );
        (extraction, text)
    }

    #[test]
    fn serialization_failure_skips_only_that_center() {
        let tk = FlakyToolkit {
            fail_serialize_center: Some(2),
            ..FlakyToolkit::default()
        };
        let cfg = TraceConfig::new().with_radius(1);
        let (extraction, text) = run(&tk, "CCO", &cfg);
        assert_eq!(extraction.skipped, 2);
        assert_eq!(extraction.occurrences, 6);
        assert!(!extraction.per_center.contains_key(&2));
        assert_eq!(
            text,
            "r0: r0:[#6:1]×2\n\
             r1: r1:[#6:1]-[#6]×1, r1:[#6:1](-[#6])-[#8]×1\n\
             \n\
             # per-center chains\n\
             C0: r0:[#6:1] → r1:[#6:1]-[#6]\n\
             C1: r0:[#6:1] → r1:[#6:1](-[#6])-[#8]"
        );
    }

    #[test]
    fn failed_queries_still_render_in_text_order() {
        let tk = FlakyToolkit {
            fail_queries: true,
            ..FlakyToolkit::default()
        };
        let cfg = TraceConfig::new().with_radius(1).with_per_center(false);
        let (_, text) = run(&tk, "CCO", &cfg);
        // Zero-count metrics tie on structure, so plain string order decides.
        assert_eq!(
            text,
            "r0: r0:[#6:1]×2, r0:[#8:1]×1\n\
             r1: r1:[#6:1](-[#6])-[#8]×1, r1:[#6:1]-[#6]×1, r1:[#8:1]-[#6]×1"
        );
        assert!(tk.query_calls.load(Ordering::SeqCst) >= 5);
    }

    #[test]
    fn fingerprint_failure_returns_zeros() {
        let tk = FlakyToolkit {
            fail_fingerprint: true,
            ..FlakyToolkit::default()
        };
        let mol = tk.parse_molecule("CCO").unwrap();
        let fp = encode_fingerprint(&tk, &mol, 2, 256, true);
        assert_eq!(fp, vec![0u8; 256]);
    }

    #[test]
    fn cache_is_shared_across_calls() {
        let tk = FlakyToolkit::default();
        let cache = MetricsCache::new();
        let cfg = TraceConfig::new().with_radius(1);
        let mol = tk.parse_molecule("CCO").unwrap();
        for _ in 0..3 {
            let extraction = extract_environments(&tk, &mol, &EnvironmentOptions::from(&cfg));
            assemble_trace(&tk, &cache, &mol, &extraction.per_center, true);
        }
        assert_eq!(cache.len(), 5);
        assert_eq!(tk.query_calls.load(Ordering::SeqCst), 5);
    }
}
