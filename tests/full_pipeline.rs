//! Golden traces for small molecules.

use ecfptrace::{
    compute_metrics, reasoning_trace, GraphToolkit, TraceConfig, TraceSession,
    DEFAULT_FINGERPRINT_SIZE,
};

fn trace(smiles: &str, cfg: &TraceConfig) -> String {
    TraceSession::new()
        .explain(smiles, cfg)
        .expect("molecule parses")
        .trace
}

#[test]
fn ethanol_radius_one() {
    let result = reasoning_trace("CCO", 1, true, false, true, 2048);
    let expected = [
        "r0: r0:[#6:1]×2, r0:[#8:1]×1",
        "r1: r1:[#6:1]-[#6]×1, r1:[#8:1]-[#6]×1, r1:[#6:1](-[#6])-[#8]×1",
        "",
        "# per-center chains",
        "C0: r0:[#6:1] → r1:[#6:1]-[#6]",
        "C1: r0:[#6:1] → r1:[#6:1](-[#6])-[#8]",
        "O2: r0:[#8:1] → r1:[#8:1]-[#6]",
    ]
    .join("\n");
    assert_eq!(result.trace, expected);
    assert_eq!(result.fingerprint.len(), 2048);
    assert!(result.fingerprint.iter().all(|&b| b <= 1));
}

#[test]
fn lone_carbon_radius_zero() {
    let result = reasoning_trace("C", 0, true, false, true, 0);
    assert_eq!(
        result.trace,
        "r0: r0:[#6:1]×1\n\n# per-center chains\nC0: r0:[#6:1]"
    );
    assert_eq!(result.fingerprint.len(), DEFAULT_FINGERPRINT_SIZE);
    assert_eq!(result.fingerprint.iter().filter(|&&b| b == 1).count(), 1);

    let metrics = compute_metrics(&GraphToolkit::new(), "r0:[#6:1]");
    assert_eq!(metrics.radius, 0);
    assert_eq!(metrics.atom_count, 1);
    assert!(!metrics.has_ring);
    assert!(!metrics.has_unsaturation);
}

#[test]
fn same_token_from_three_centers_counts_three() {
    let cfg = TraceConfig::new().with_radius(0);
    let expected = [
        "r0: r0:[#6:1]×1, r0:[#8:1]×3",
        "",
        "# per-center chains",
        "O0: r0:[#8:1]",
        "C1: r0:[#6:1]",
        "O2: r0:[#8:1]",
        "O3: r0:[#8:1]",
    ]
    .join("\n");
    assert_eq!(trace("OC(O)O", &cfg), expected);
}

#[test]
fn cyclopropane_keeps_sparse_chains() {
    let cfg = TraceConfig::new().with_radius(2);
    let expected = [
        "r0: r0:[#6:1]×3",
        "r1: r1:[#6:1](-[#6])-[#6]×3",
        "r2: r2:[#6:1]-1-[#6]-[#6]1×1",
        "",
        "# per-center chains",
        "C0: r0:[#6:1] → r1:[#6:1](-[#6])-[#6] → r2:[#6:1]-1-[#6]-[#6]1",
        "C1: r0:[#6:1] → r1:[#6:1](-[#6])-[#6]",
        "C2: r0:[#6:1] → r1:[#6:1](-[#6])-[#6]",
    ]
    .join("\n");
    assert_eq!(trace("C1CC1", &cfg), expected);
}

#[test]
fn benzene_aromatic_and_kekule_tokens() {
    let cfg = TraceConfig::new().with_radius(1).with_per_center(false);
    assert_eq!(
        trace("c1ccccc1", &cfg),
        "r0: r0:[#6:1]×6\nr1: r1:[#6:1](:[#6]):[#6]×6"
    );
    assert_eq!(
        trace("c1ccccc1", &cfg.clone().with_kekulize(true)),
        "r0: r0:[#6:1]×6\nr1: r1:[#6:1](-[#6])=[#6]×6"
    );
}

#[test]
fn without_radius_tag_or_root_marker() {
    let cfg = TraceConfig::new()
        .with_radius(1)
        .with_radius_tag(false)
        .with_mark_root(false)
        .with_per_center(false);
    // Ethane: both carbons share one radius-0 and one radius-1 token.
    assert_eq!(trace("CC", &cfg), "r0: [#6]×2\nr1: [#6]-[#6]×1");
    assert_eq!(
        trace("CCO", &cfg),
        "r0: [#6]×2, [#8]×1\nr1: [#6]-[#6]×1, [#6]-[#8]×1, [#6]-[#6]-[#8]×1"
    );
}

#[test]
fn radius_lines_strictly_increase() {
    let cfg = TraceConfig::new().with_radius(3).with_per_center(false);
    let text = trace("CC(=O)Nc1ccc(O)cc1", &cfg);
    let radii: Vec<u32> = text
        .lines()
        .map(|line| {
            line.strip_prefix('r')
                .and_then(|rest| rest.split_once(':'))
                .and_then(|(n, _)| n.parse().ok())
                .expect("radius line")
        })
        .collect();
    assert!(!radii.is_empty());
    assert!(radii.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(radii[0], 0);
}

#[test]
fn chains_cover_every_center_once_in_radius_order() {
    let session = TraceSession::new();
    let cfg = TraceConfig::new().with_radius(2);
    let report = session.explain("CC(=O)O", &cfg).unwrap();

    let chain_lines: Vec<&str> = report
        .trace
        .split("# per-center chains\n")
        .nth(1)
        .expect("chain section")
        .lines()
        .collect();
    assert_eq!(chain_lines.len(), report.per_center.len());
    assert_eq!(report.per_center.len(), 4);

    for (line, (center, chain)) in chain_lines.iter().zip(&report.per_center) {
        let (label, tokens) = line.split_once(": ").unwrap();
        assert!(label.ends_with(&center.to_string()));
        let expected: Vec<&str> = chain.values().map(String::as_str).collect();
        assert_eq!(tokens.split(" → ").collect::<Vec<_>>(), expected);
        let radii: Vec<u32> = chain.keys().copied().collect();
        assert!(radii.windows(2).all(|w| w[0] < w[1]));
    }
}
