//! User-supplied latency lookup table.

use std::io::Read;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{MapperError, MapperResult};
use crate::gate::is_swap_kind;

use super::{Latency, LatencyDescription, LatencyQuery, SWAP_KIND};

/// Rules that share one gate type.
#[derive(Debug, Clone, Default)]
struct KindRules {
    /// Indexed by arity (1 or 2).
    by_arity: [Option<u32>; 3],
    /// Keyed by `(control, target)` physical qubits.
    placed: FxHashMap<(Option<u32>, u32), u32>,
}

/// On-disk form of a table: either a bare rule list or rules plus a default.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableSource {
    Rules(Vec<LatencyDescription>),
    WithDefault {
        rules: Vec<LatencyDescription>,
        default: Option<u32>,
    },
}

/// Latency table built from [`LatencyDescription`] rules.
///
/// Lookup picks the most specific matching rule:
///
/// 1. gate type on the exact physical qubits (swap rules match either
///    direction, other two-qubit rules are direction sensitive),
/// 2. gate type and arity,
/// 3. arity only,
/// 4. the explicit default.
///
/// Later rules override earlier rules with the same key. Swap type tags are
/// canonicalized, so `"swp"` and `"SWAP"` rules both describe router swaps.
///
/// # Example
///
/// ```
/// use toqm::latency::{latencies_from_simple, Latency, LatencyDescription, LatencyQuery, Table};
///
/// let mut rules = latencies_from_simple(1, 2, 6);
/// rules.push(LatencyDescription::for_pair("cx", 0, 1, 5));
/// let table = Table::new(rules).unwrap();
///
/// assert_eq!(table.latency(&LatencyQuery::placed("cx", Some(0), 1)), 5);
/// assert_eq!(table.latency(&LatencyQuery::placed("cx", Some(1), 0)), 2);
/// assert_eq!(table.latency(&LatencyQuery::swap(3, 4)), 6);
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    kinds: FxHashMap<String, KindRules>,
    by_arity: [Option<u32>; 3],
    default: Option<u32>,
    num_rules: usize,
}

impl Table {
    /// Build a table from rules.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if `rules` is empty, a rule is
    /// malformed, or no fallback exists for one- and two-qubit gates.
    pub fn new(rules: impl IntoIterator<Item = LatencyDescription>) -> MapperResult<Self> {
        Self::build(rules, None)
    }

    /// Build a table from rules plus a default for unmatched queries.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if a rule is malformed.
    pub fn with_default(
        rules: impl IntoIterator<Item = LatencyDescription>,
        default: u32,
    ) -> MapperResult<Self> {
        Self::build(rules, Some(default))
    }

    /// Load a table from JSON: either an array of rules or an object with
    /// `rules` and an optional `default`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Json`] for malformed JSON and
    /// [`MapperError::Configuration`] for an unusable rule set.
    pub fn from_json_reader(reader: impl Read) -> MapperResult<Self> {
        match serde_json::from_reader(reader)? {
            TableSource::Rules(rules) => Self::new(rules),
            TableSource::WithDefault { rules, default } => Self::build(rules, default),
        }
    }

    fn build(
        rules: impl IntoIterator<Item = LatencyDescription>,
        default: Option<u32>,
    ) -> MapperResult<Self> {
        let mut table = Self {
            kinds: FxHashMap::default(),
            by_arity: [None; 3],
            default,
            num_rules: 0,
        };

        for rule in rules {
            table.insert(rule)?;
        }

        if table.num_rules == 0 && table.default.is_none() {
            return Err(MapperError::Configuration(
                "latency table has no rules and no default".into(),
            ));
        }
        if table.default.is_none() {
            for arity in [1, 2] {
                if table.by_arity[arity].is_none() {
                    return Err(MapperError::Configuration(format!(
                        "latency table has no default and no rule for all {arity}-qubit gates"
                    )));
                }
            }
        }
        Ok(table)
    }

    fn insert(&mut self, rule: LatencyDescription) -> MapperResult<()> {
        let arity = rule.num_qubits as usize;
        if !(1..=2).contains(&arity) {
            return Err(MapperError::Configuration(format!(
                "latency rule for {arity} qubits; only 1 and 2 are supported"
            )));
        }

        match (&rule.kind, rule.is_placed()) {
            (None, true) => {
                return Err(MapperError::Configuration(
                    "latency rule names physical qubits but no gate type".into(),
                ));
            }
            (None, false) => self.by_arity[arity] = Some(rule.latency),
            (Some(kind), placed) => {
                let entry = self.kinds.entry(canonical(kind).to_string()).or_default();
                if placed {
                    let target = match (arity, rule.control, rule.target) {
                        (1, None, Some(t)) | (2, Some(_), Some(t)) => t,
                        _ => {
                            return Err(MapperError::Configuration(format!(
                                "latency rule for '{kind}' names qubits inconsistent with arity {arity}"
                            )));
                        }
                    };
                    entry.placed.insert((rule.control, target), rule.latency);
                } else {
                    entry.by_arity[arity] = Some(rule.latency);
                }
            }
        }
        self.num_rules += 1;
        Ok(())
    }

    /// Number of rules the table was built from.
    pub fn len(&self) -> usize {
        self.num_rules
    }

    /// Whether the table was built without rules (default only).
    pub fn is_empty(&self) -> bool {
        self.num_rules == 0
    }

    fn lookup_placed(&self, rules: &KindRules, query: &LatencyQuery<'_>) -> Option<u32> {
        let target = query.target?;
        if let Some(&latency) = rules.placed.get(&(query.control, target)) {
            return Some(latency);
        }
        // Swaps are symmetric.
        match query.control {
            Some(control) if is_swap_kind(query.kind) => {
                rules.placed.get(&(Some(target), control)).copied()
            }
            _ => None,
        }
    }
}

fn canonical(kind: &str) -> &str {
    if is_swap_kind(kind) { SWAP_KIND } else { kind }
}

impl Latency for Table {
    fn name(&self) -> &str {
        "Table"
    }

    fn latency(&self, query: &LatencyQuery<'_>) -> u32 {
        let arity = (query.arity as usize).min(2);
        if let Some(rules) = self.kinds.get(canonical(query.kind)) {
            if let Some(latency) = self.lookup_placed(rules, query) {
                return latency;
            }
            if let Some(latency) = rules.by_arity[arity] {
                return latency;
            }
        }
        self.by_arity[arity].or(self.default).unwrap_or(0)
    }

    fn clone_box(&self) -> Box<dyn Latency> {
        Box::new(self.clone())
    }
}
