//! Root layouts.
//!
//! Turns a caller-supplied initial mapping into a complete logical-to-physical
//! layout, or proposes candidate layouts when none is given.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::config::InitialMapping;
use crate::context::SearchContext;
use crate::error::{MapperError, MapperResult};

/// Validate and complete a caller-supplied mapping.
pub(crate) fn from_mapping(
    mapping: &InitialMapping,
    ctx: &SearchContext<'_>,
) -> MapperResult<Vec<u32>> {
    match mapping {
        InitialMapping::Laq(laq) => check_laq(laq, ctx).map(|()| laq.clone()),
        InitialMapping::Qal(qal) => complete_qal(qal, ctx),
    }
}

/// Which logical qubits `mapping` places explicitly. Empty without a
/// mapping.
pub(crate) fn caller_placed(mapping: Option<&InitialMapping>, num_logical: u32) -> Vec<bool> {
    match mapping {
        None => Vec::new(),
        Some(InitialMapping::Laq(_)) => vec![true; num_logical as usize],
        Some(InitialMapping::Qal(qal)) => {
            let mut placed = vec![false; num_logical as usize];
            for &logical in qal.iter().flatten() {
                if let Some(slot) = placed.get_mut(logical as usize) {
                    *slot = true;
                }
            }
            placed
        }
    }
}

fn check_physical(physical: u32, ctx: &SearchContext<'_>) -> MapperResult<()> {
    if physical >= ctx.num_physical() {
        return Err(MapperError::PhysicalQubitOutOfRange {
            qubit: physical,
            num_physical: ctx.num_physical(),
        });
    }
    if !ctx.is_usable(physical) {
        return Err(MapperError::InvalidInitialMapping(format!(
            "physical qubit {physical} is outside the usable subset"
        )));
    }
    Ok(())
}

fn check_laq(laq: &[u32], ctx: &SearchContext<'_>) -> MapperResult<()> {
    let num_logical = ctx.circuit.num_logical() as usize;
    if laq.len() != num_logical {
        return Err(MapperError::InvalidInitialMapping(format!(
            "expected {num_logical} logical-to-physical entries, got {}",
            laq.len()
        )));
    }
    let mut used = FxHashSet::default();
    for &physical in laq {
        check_physical(physical, ctx)?;
        if !used.insert(physical) {
            return Err(MapperError::InvalidInitialMapping(format!(
                "physical qubit {physical} is assigned twice"
            )));
        }
    }
    Ok(())
}

fn complete_qal(qal: &[Option<u32>], ctx: &SearchContext<'_>) -> MapperResult<Vec<u32>> {
    let num_logical = ctx.circuit.num_logical();
    if qal.len() != ctx.num_physical() as usize {
        return Err(MapperError::InvalidInitialMapping(format!(
            "expected {} physical-to-logical entries, got {}",
            ctx.num_physical(),
            qal.len()
        )));
    }

    let mut laq: Vec<Option<u32>> = vec![None; num_logical as usize];
    for (physical, logical) in qal.iter().enumerate() {
        let Some(logical) = *logical else {
            continue;
        };
        let physical = physical as u32;
        let slot = laq.get_mut(logical as usize).ok_or_else(|| {
            MapperError::InvalidInitialMapping(format!(
                "logical qubit {logical} out of range (circuit has {num_logical})"
            ))
        })?;
        if slot.is_some() {
            return Err(MapperError::InvalidInitialMapping(format!(
                "logical qubit {logical} is placed twice"
            )));
        }
        check_physical(physical, ctx)?;
        *slot = Some(physical);
    }

    let mut placed: Vec<u32> = laq.iter().flatten().copied().collect();
    let mut complete = Vec::with_capacity(laq.len());
    for slot in laq {
        let physical = match slot {
            Some(p) => p,
            None => {
                let p = nearest_free(&placed, ctx).ok_or(MapperError::TooManyLogicalQubits {
                    required: num_logical,
                    available: ctx.usable.len() as u32,
                })?;
                placed.push(p);
                p
            }
        };
        complete.push(physical);
    }
    Ok(complete)
}

/// Free usable qubit closest to any placed qubit, lowest index on ties.
fn nearest_free(placed: &[u32], ctx: &SearchContext<'_>) -> Option<u32> {
    ctx.usable
        .iter()
        .copied()
        .filter(|p| !placed.contains(p))
        .min_by_key(|&p| {
            let d = placed
                .iter()
                .filter_map(|&q| ctx.coupling.distance(p, q))
                .min()
                .unwrap_or(u32::MAX);
            (d, p)
        })
}

/// Candidate root layouts when no mapping is given: the identity over the
/// usable qubits, plus with `explore` one compact placement grown
/// breadth-first from every usable qubit. Duplicates are dropped and order
/// is deterministic.
pub(crate) fn seed_layouts(ctx: &SearchContext<'_>, explore: bool) -> Vec<Vec<u32>> {
    let n = ctx.circuit.num_logical() as usize;
    let identity: Vec<u32> = ctx.usable[..n].to_vec();
    let mut layouts = vec![identity];
    if !explore || n == 0 {
        return layouts;
    }

    let mut seen: FxHashSet<Vec<u32>> = layouts.iter().cloned().collect();
    for &start in ctx.usable {
        let layout = compact_layout(ctx, start, n);
        if seen.insert(layout.clone()) {
            layouts.push(layout);
        }
    }
    layouts
}

/// First `n` usable qubits in breadth-first order from `start`, restarting
/// from the lowest unvisited usable qubit when a component runs out.
fn compact_layout(ctx: &SearchContext<'_>, start: u32, n: usize) -> Vec<u32> {
    let mut visited = vec![false; ctx.num_physical() as usize];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();
    let mut seeds = std::iter::once(start).chain(ctx.usable.iter().copied());

    while order.len() < n {
        if queue.is_empty() {
            let Some(seed) = seeds.find(|&p| !visited[p as usize]) else {
                break;
            };
            visited[seed as usize] = true;
            queue.push_back(seed);
        }
        while let Some(current) = queue.pop_front() {
            order.push(current);
            if order.len() == n {
                break;
            }
            for &neighbor in ctx.coupling.neighbors(current) {
                if !visited[neighbor as usize] && ctx.is_usable(neighbor) {
                    visited[neighbor as usize] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }
    order
}
