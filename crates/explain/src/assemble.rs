//! Trace rendering.
//!
//! ```text
//! r0: r0:[#6:1]×2, r0:[#8:1]×1
//! r1: r1:[#6:1]-[#6]×1, r1:[#8:1]-[#6]×1, r1:[#6:1](-[#6])-[#8]×1
//!
//! # per-center chains
//! C0: r0:[#6:1] → r1:[#6:1]-[#6]
//! ```

use std::collections::BTreeMap;

use toolkit::{AtomIdx, MolecularToolkit};

use crate::environment::PerCenterMap;
use crate::metrics::MetricsCache;

/// Header line opening the per-center section.
pub const CHAIN_HEADER: &str = "# per-center chains";

/// `radius -> (token -> occurrence count)`.
pub type ByRadiusMap = BTreeMap<u32, BTreeMap<String, usize>>;

/// Count each token once per center that carries it at that radius.
pub fn fold_by_radius(per_center: &PerCenterMap) -> ByRadiusMap {
    let mut by_radius = ByRadiusMap::new();
    for chain in per_center.values() {
        for (&radius, token) in chain {
            *by_radius
                .entry(radius)
                .or_default()
                .entry(token.clone())
                .or_default() += 1;
        }
    }
    by_radius
}

/// One summary line per radius, tokens ranked by complexity.
pub fn render_radius_lines<T: MolecularToolkit>(
    toolkit: &T,
    cache: &MetricsCache,
    by_radius: &ByRadiusMap,
) -> Vec<String> {
    by_radius
        .iter()
        .map(|(radius, counts)| {
            let mut tokens: Vec<&str> = counts.keys().map(String::as_str).collect();
            cache.rank(toolkit, &mut tokens);
            let entries: Vec<String> = tokens
                .iter()
                .map(|token| format!("{token}×{}", counts[*token]))
                .collect();
            format!("r{radius}: {}", entries.join(", "))
        })
        .collect()
}

/// Per-atom chain lines, `symbol` labelling each center.
pub fn render_chain_lines<F>(per_center: &PerCenterMap, mut symbol: F) -> Vec<String>
where
    F: FnMut(AtomIdx) -> String,
{
    per_center
        .iter()
        .map(|(&center, chain)| {
            let tokens: Vec<&str> = chain.values().map(String::as_str).collect();
            format!("{}{center}: {}", symbol(center), tokens.join(" → "))
        })
        .collect()
}

/// Render the complete trace. An empty map renders as an empty string.
pub fn assemble_trace<T: MolecularToolkit>(
    toolkit: &T,
    cache: &MetricsCache,
    mol: &T::Molecule,
    per_center: &PerCenterMap,
    include_per_center: bool,
) -> String {
    let mut lines = render_radius_lines(toolkit, cache, &fold_by_radius(per_center));
    if include_per_center && !per_center.is_empty() {
        lines.push(String::new());
        lines.push(CHAIN_HEADER.to_string());
        lines.extend(render_chain_lines(per_center, |center| {
            toolkit
                .atom_symbol(mol, center)
                .unwrap_or_else(|_| "*".to_string())
        }));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolkit::GraphToolkit;

    fn map(entries: &[(AtomIdx, u32, &str)]) -> PerCenterMap {
        let mut out = PerCenterMap::new();
        for &(center, radius, token) in entries {
            out.entry(center)
                .or_default()
                .insert(radius, token.to_string());
        }
        out
    }

    #[test]
    fn counts_same_token_across_centers() {
        let per_center = map(&[
            (0, 0, "r0:[#6:1]"),
            (1, 0, "r0:[#6:1]"),
            (2, 0, "r0:[#6:1]"),
            (2, 1, "r1:[#6:1]-[#6]"),
        ]);
        let by_radius = fold_by_radius(&per_center);
        assert_eq!(by_radius[&0]["r0:[#6:1]"], 3);
        assert_eq!(by_radius[&1]["r1:[#6:1]-[#6]"], 1);
    }

    #[test]
    fn radius_lines_ascend_numerically() {
        let per_center = map(&[(0, 10, "r10:x"), (0, 2, "r2:y"), (0, 0, "r0:z")]);
        let lines = render_radius_lines(
            &GraphToolkit::new(),
            &MetricsCache::new(),
            &fold_by_radius(&per_center),
        );
        assert_eq!(lines, vec!["r0: r0:z×1", "r2: r2:y×1", "r10: r10:x×1"]);
    }

    #[test]
    fn chain_lines_use_symbol_and_arrow() {
        let per_center = map(&[(3, 0, "a"), (3, 2, "c"), (1, 0, "b")]);
        let lines = render_chain_lines(&per_center, |c| {
            if c == 3 { "N".into() } else { "C".into() }
        });
        assert_eq!(lines, vec!["C1: b", "N3: a → c"]);
    }

    #[test]
    fn empty_map_renders_nothing() {
        let tk = GraphToolkit::new();
        let mol = tk.parse_molecule("").unwrap();
        let text = assemble_trace(&tk, &MetricsCache::new(), &mol, &PerCenterMap::new(), true);
        assert_eq!(text, "");
    }

    #[test]
    fn full_trace_layout() {
        let tk = GraphToolkit::new();
        let mol = tk.parse_molecule("CO").unwrap();
        let per_center = map(&[(0, 0, "r0:[#6:1]"), (1, 0, "r0:[#8:1]")]);
        let cache = MetricsCache::new();
        let text = assemble_trace(&tk, &cache, &mol, &per_center, true);
        assert_eq!(
            text,
            "r0: r0:[#6:1]×1, r0:[#8:1]×1\n\n# per-center chains\nC0: r0:[#6:1]\nO1: r0:[#8:1]"
        );
        assert_eq!(cache.len(), 2);

        let without_chains = assemble_trace(&tk, &cache, &mol, &per_center, false);
        assert_eq!(without_chains, "r0: r0:[#6:1]×1, r0:[#8:1]×1");
    }

    #[test]
    fn unknown_center_falls_back_to_star() {
        let tk = GraphToolkit::new();
        let mol = tk.parse_molecule("C").unwrap();
        let per_center = map(&[(7, 0, "r0:[#6:1]")]);
        let text = assemble_trace(&tk, &MetricsCache::new(), &mol, &per_center, true);
        assert!(text.ends_with("*7: r0:[#6:1]"));
    }
}
