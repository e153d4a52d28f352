//! Token metrics, the shared metrics cache, and the complexity order.
//!
//! Metrics are derived from the token text alone, so they are a pure
//! function of the token string and can be memoized across calls. The cache
//! is append-only: the first value stored for a token is the only value any
//! reader ever sees.

use std::sync::{Arc, Mutex, MutexGuard};

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use toolkit::MolecularToolkit;

use crate::token::{token_radius, token_substructure};

/// Structural facts about one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub radius: u32,
    pub atom_count: usize,
    pub bond_count: usize,
    pub has_ring: bool,
    /// Atoms other than hydrogen and carbon.
    pub hetero_count: usize,
    /// Any double, triple or aromatic bond.
    pub has_unsaturation: bool,
    pub token: String,
}

/// Sort key ordering tokens from structurally simplest to most complex.
///
/// Fields compare in declaration order; the trailing token string makes the
/// order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplexityKey<'a> {
    pub radius: u32,
    pub atom_count: usize,
    pub bond_count: usize,
    pub has_ring: bool,
    pub hetero_count: usize,
    pub has_unsaturation: bool,
    pub token: &'a str,
}

impl TokenMetrics {
    /// Metrics for a token whose substructure could not be parsed.
    pub fn unparsed(token: &str) -> Self {
        Self {
            radius: token_radius(token),
            atom_count: 0,
            bond_count: 0,
            has_ring: false,
            hetero_count: 0,
            has_unsaturation: false,
            token: token.to_string(),
        }
    }

    pub fn complexity_key(&self) -> ComplexityKey<'_> {
        ComplexityKey {
            radius: self.radius,
            atom_count: self.atom_count,
            bond_count: self.bond_count,
            has_ring: self.has_ring,
            hetero_count: self.hetero_count,
            has_unsaturation: self.has_unsaturation,
            token: &self.token,
        }
    }
}

/// Re-parse the token's substructure through the toolkit. Never fails: an
/// unparseable token gets [`TokenMetrics::unparsed`].
pub fn compute_metrics<T: MolecularToolkit>(toolkit: &T, token: &str) -> TokenMetrics {
    let query = match toolkit.parse_query(token_substructure(token)) {
        Ok(query) => query,
        Err(err) => {
            trace!(token, error = %err, "token_parse_failed");
            return TokenMetrics::unparsed(token);
        }
    };
    TokenMetrics {
        radius: token_radius(token),
        atom_count: query.atomic_numbers.len(),
        bond_count: query.bonds.len(),
        has_ring: query.ring_count > 0,
        hetero_count: query
            .atomic_numbers
            .iter()
            .filter(|&&z| z != 1 && z != 6)
            .count(),
        has_unsaturation: query.bonds.iter().any(|b| b.is_unsaturated()),
        token: token.to_string(),
    }
}

/// Append-only `token -> metrics` memo shared by every call of a session.
///
/// One lock guards lookup and insert. Computation runs without the lock, so
/// two threads may compute the same token concurrently; the first insert
/// wins and both get the stored value back.
#[derive(Debug, Default)]
pub struct MetricsCache {
    entries: Mutex<FxHashMap<String, Arc<TokenMetrics>>>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metrics for `token`, computing and storing them on a miss.
    pub fn metrics_for<T: MolecularToolkit>(&self, toolkit: &T, token: &str) -> Arc<TokenMetrics> {
        if let Some(hit) = self.get(token) {
            return hit;
        }
        let computed = Arc::new(compute_metrics(toolkit, token));
        let mut entries = self.lock();
        Arc::clone(entries.entry(token.to_string()).or_insert(computed))
    }

    pub fn get(&self, token: &str) -> Option<Arc<TokenMetrics>> {
        self.lock().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sort tokens by ascending complexity, resolving metrics through the cache.
    ///
    /// Every token is resolved, so even a lone token ends up cached.
    pub fn rank<'a, T: MolecularToolkit>(&self, toolkit: &T, tokens: &mut [&'a str]) {
        let mut keyed: Vec<(Arc<TokenMetrics>, &'a str)> = tokens
            .iter()
            .map(|&token| (self.metrics_for(toolkit, token), token))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        for (slot, (_, token)) in tokens.iter_mut().zip(keyed) {
            *slot = token;
        }
    }

    // Entries are immutable once inserted, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, Arc<TokenMetrics>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PartialOrd for TokenMetrics {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenMetrics {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.complexity_key().cmp(&other.complexity_key())
    }
}
