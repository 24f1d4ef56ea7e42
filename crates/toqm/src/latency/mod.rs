//! Gate latency models.
//!
//! A [`Latency`] maps an operation (its type, arity and, when known, the
//! physical qubits it runs on) to a duration in cycles. The expander uses it
//! to advance per-qubit occupancy and the mapper uses it to compute the ideal
//! schedule length of a circuit.
//!
//! # Built-in models
//!
//! | Model | 1-qubit | 2-qubit | swap |
//! |-------|---------|---------|------|
//! | [`Latency1`] | 1 | 1 | 1 |
//! | [`Latency1_2_6`] | 1 | 2 | 6 |
//! | [`Latency1_3`] | 1 | 3 | 3 |
//!
//! A [`Table`] is built from [`LatencyDescription`] rules and resolves the
//! most specific matching rule for every query.

mod builtin;
mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

pub use builtin::{Latency1, Latency1_2_6, Latency1_3};
pub use table::Table;

/// Gate type tag used for router-inserted swaps.
pub const SWAP_KIND: &str = "swap";

/// An operation whose latency is being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyQuery<'a> {
    /// Gate type tag.
    pub kind: &'a str,
    /// Number of qubits the operation acts on.
    pub arity: u32,
    /// Physical control qubit, when placed.
    pub control: Option<u32>,
    /// Physical target qubit, when placed.
    pub target: Option<u32>,
}

impl<'a> LatencyQuery<'a> {
    /// A query that does not name physical qubits.
    pub fn unplaced(kind: &'a str, arity: u32) -> Self {
        Self {
            kind,
            arity,
            control: None,
            target: None,
        }
    }

    /// A query for an operation placed on physical qubits.
    pub fn placed(kind: &'a str, control: Option<u32>, target: u32) -> Self {
        Self {
            kind,
            arity: if control.is_some() { 2 } else { 1 },
            control,
            target: Some(target),
        }
    }

    /// A query for a router-inserted swap on a physical edge.
    pub fn swap(a: u32, b: u32) -> Self {
        Self::placed(SWAP_KIND, Some(a), b)
    }
}

/// Latency model policy.
///
/// Implementations must be pure: the same query always yields the same
/// duration. They are shared read-only across parallel expansion.
pub trait Latency: Send + Sync + fmt::Debug {
    /// Name of the model, for logging.
    fn name(&self) -> &str;

    /// Duration of the queried operation, in cycles.
    fn latency(&self, query: &LatencyQuery<'_>) -> u32;

    /// Duplicate this model into an independently owned box.
    fn clone_box(&self) -> Box<dyn Latency>;
}

impl Clone for Box<dyn Latency> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// One rule of a latency [`Table`].
///
/// Fields left as `None` act as wildcards. A rule that names physical qubits
/// must also name a gate type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyDescription {
    /// Number of qubits the rule applies to.
    pub num_qubits: u32,
    /// Gate type the rule applies to, or any type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Physical control qubit, or any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u32>,
    /// Physical target qubit, or any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Duration in cycles.
    pub latency: u32,
}

impl LatencyDescription {
    /// Rule for every gate acting on `num_qubits` qubits.
    pub fn for_arity(num_qubits: u32, latency: u32) -> Self {
        Self {
            num_qubits,
            kind: None,
            control: None,
            target: None,
            latency,
        }
    }

    /// Rule for one gate type acting on `num_qubits` qubits.
    pub fn for_gate(num_qubits: u32, kind: impl Into<String>, latency: u32) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::for_arity(num_qubits, latency)
        }
    }

    /// Rule for a single-qubit gate type on one physical qubit.
    pub fn for_qubit(kind: impl Into<String>, target: u32, latency: u32) -> Self {
        Self {
            target: Some(target),
            ..Self::for_gate(1, kind, latency)
        }
    }

    /// Rule for a two-qubit gate type on one physical pair.
    pub fn for_pair(kind: impl Into<String>, control: u32, target: u32, latency: u32) -> Self {
        Self {
            control: Some(control),
            target: Some(target),
            ..Self::for_gate(2, kind, latency)
        }
    }

    /// Whether the rule names physical qubits.
    pub fn is_placed(&self) -> bool {
        self.control.is_some() || self.target.is_some()
    }
}

/// Latency rules for a device on which all 1-qubit, 2-qubit and swap gates
/// take fixed cycle counts, irrespective of qubits.
pub fn latencies_from_simple(
    one_qubit_cycles: u32,
    two_qubit_cycles: u32,
    swap_cycles: u32,
) -> Vec<LatencyDescription> {
    vec![
        LatencyDescription::for_arity(1, one_qubit_cycles),
        LatencyDescription::for_arity(2, two_qubit_cycles),
        LatencyDescription::for_gate(2, SWAP_KIND, swap_cycles),
    ]
}

/// A measured gate duration, in arbitrary but consistent units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDuration {
    /// Gate type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Physical qubits the duration applies to; empty for a type-wide default.
    #[serde(default)]
    pub qubits: Vec<u32>,
    /// Duration.
    pub duration: f64,
}

/// Convert raw durations into latency rules.
///
/// Cycles are `round(duration * scale / min_duration)` where `min_duration`
/// is the shortest non-zero duration. Type-wide defaults (no qubits) emit a
/// rule for both 1 and 2 qubits since the arity is unknown.
///
/// # Errors
///
/// Returns [`MapperError::Configuration`] if no duration is non-zero or an
/// entry names more than two qubits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_durations(
    durations: &[GateDuration],
    scale: u32,
) -> MapperResult<Vec<LatencyDescription>> {
    let min_duration = durations
        .iter()
        .map(|d| d.duration)
        .filter(|&d| d > 0.0)
        .min_by(f64::total_cmp)
        .ok_or_else(|| {
            MapperError::Configuration("durations must be specified for the target".into())
        })?;

    let normalize = |d: f64| (d * f64::from(scale) / min_duration).round().max(0.0) as u32;

    let mut rules = Vec::with_capacity(durations.len() + 1);
    for entry in durations {
        let cycles = normalize(entry.duration);
        match entry.qubits.as_slice() {
            [] => {
                rules.push(LatencyDescription::for_gate(1, entry.kind.clone(), cycles));
                rules.push(LatencyDescription::for_gate(2, entry.kind.clone(), cycles));
            }
            [target] => rules.push(LatencyDescription::for_qubit(
                entry.kind.clone(),
                *target,
                cycles,
            )),
            [control, target] => rules.push(LatencyDescription::for_pair(
                entry.kind.clone(),
                *control,
                *target,
                cycles,
            )),
            more => {
                return Err(MapperError::Configuration(format!(
                    "duration for '{}' names {} qubits; at most 2 are supported",
                    entry.kind,
                    more.len()
                )));
            }
        }
    }
    Ok(rules)
}
