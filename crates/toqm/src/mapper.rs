//! The best-first search engine.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument, trace, warn};

use crate::arena::NodeArena;
use crate::circuit::Circuit;
use crate::config::{InitialMapping, InitialSearch, MapperConfig};
use crate::context::SearchContext;
use crate::cost::{Cost, CostFunc};
use crate::coupling::CouplingMap;
use crate::error::{MapperError, MapperResult};
use crate::expander::Expander;
use crate::filter::{Filter, FilterVerdict};
use crate::gate::{GateOp, ScheduledGateOp, ScheduledOp};
use crate::latency::Latency;
use crate::layout;
use crate::node::{LayoutPhase, Node, NodeId, StepOp};
use crate::node_mod::NodeMod;
use crate::queue::{NodeQueue, QueueEntry};
use crate::result::ToqmResult;

/// Time-optimal qubit mapper.
///
/// The mapper is assembled from one queue, expander, cost function and
/// latency model plus any number of node modifiers and filters. Stateful
/// policies (queue and filters) are cloned fresh for every run, so one
/// mapper may be reused for many circuits.
///
/// # Example
///
/// ```
/// use toqm::{CouplingMap, GateOp, ToqmMapper};
/// use toqm::cost::CXFrontier;
/// use toqm::expander::DefaultExpander;
/// use toqm::latency::Latency1_2_6;
/// use toqm::queue::DefaultQueue;
///
/// let mapper = ToqmMapper::new(DefaultQueue::new(), DefaultExpander, CXFrontier, Latency1_2_6);
/// let coupling = CouplingMap::linear(3);
/// let gates = [GateOp::two_qubit(0, "cx", 0, 2)];
///
/// let result = mapper.run(&gates, 3, &coupling).unwrap();
/// assert_eq!(result.num_swaps, 1);
/// assert_eq!(result.cycles, 8);
/// ```
#[derive(Debug, Clone)]
pub struct ToqmMapper {
    queue: Box<dyn NodeQueue>,
    expander: Box<dyn Expander>,
    cost: Box<dyn CostFunc>,
    latency: Box<dyn Latency>,
    node_mods: Vec<Box<dyn NodeMod>>,
    filters: Vec<Box<dyn Filter>>,
    config: MapperConfig,
}

impl ToqmMapper {
    /// Create a mapper from its four required policies.
    pub fn new(
        queue: impl NodeQueue + 'static,
        expander: impl Expander + 'static,
        cost: impl CostFunc + 'static,
        latency: impl Latency + 'static,
    ) -> Self {
        Self::from_boxed(
            Box::new(queue),
            Box::new(expander),
            Box::new(cost),
            Box::new(latency),
            Vec::new(),
            Vec::new(),
        )
    }

    /// Create a mapper from boxed policies.
    pub fn from_boxed(
        queue: Box<dyn NodeQueue>,
        expander: Box<dyn Expander>,
        cost: Box<dyn CostFunc>,
        latency: Box<dyn Latency>,
        node_mods: Vec<Box<dyn NodeMod>>,
        filters: Vec<Box<dyn Filter>>,
    ) -> Self {
        Self {
            queue,
            expander,
            cost,
            latency,
            node_mods,
            filters,
            config: MapperConfig::default(),
        }
    }

    /// Add a node modifier; modifiers run in insertion order.
    #[must_use]
    pub fn with_node_mod(mut self, node_mod: impl NodeMod + 'static) -> Self {
        self.node_mods.push(Box::new(node_mod));
        self
    }

    /// Add a filter; filters run in insertion order.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut MapperConfig {
        &mut self.config
    }

    /// Latency model.
    pub fn latency(&self) -> &dyn Latency {
        self.latency.as_ref()
    }

    /// Set the initial search using the host convention (`0` off, `-1`
    /// unlimited, `n` free swaps).
    pub fn set_initial_search_cycles(&mut self, cycles: i64) {
        self.config.initial_search = InitialSearch::from_cycles(cycles);
    }

    /// Keep every popped node until the run ends.
    pub fn set_retain_popped(&mut self, retain: bool) {
        self.config.retain_popped = retain;
    }

    /// Start from a physical-to-logical mapping; unplaced logical qubits are
    /// placed next to the placed ones.
    pub fn set_initial_mapping_qal(&mut self, qal: Vec<Option<u32>>) {
        self.config.initial_mapping = Some(InitialMapping::Qal(qal));
    }

    /// Start from a logical-to-physical mapping.
    pub fn set_initial_mapping_laq(&mut self, laq: Vec<u32>) {
        self.config.initial_mapping = Some(InitialMapping::Laq(laq));
    }

    /// Restrict the layout to a subset of physical qubits.
    pub fn set_physical_subset(&mut self, subset: Option<Vec<u32>>) {
        self.config.physical_subset = subset;
    }

    /// Let the mapper choose its own roots again.
    pub fn clear_initial_mapping(&mut self) {
        self.config.initial_mapping = None;
        self.config.physical_subset = None;
    }

    /// Promote progress reports to `info` level.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    /// Route `gates` over `num_logical` logical qubits onto `coupling`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error (see
    /// [`MapperError::is_invalid_input`]) for malformed gates or mappings,
    /// [`MapperError::EmptyQueue`] if no complete schedule was found, and
    /// [`MapperError::BudgetExhausted`] if a search limit ran out without
    /// best-effort results enabled.
    #[instrument(skip(self, gates, coupling), fields(num_gates = gates.len()))]
    pub fn run(
        &self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
    ) -> MapperResult<ToqmResult> {
        let config = &self.config;
        config.validate(coupling.num_qubits())?;

        let (usable, device) = match &config.physical_subset {
            Some(subset) => {
                let mut usable = subset.clone();
                usable.sort_unstable();
                usable.dedup();
                let device = coupling.restricted(&usable)?;
                (usable, Cow::Owned(device))
            }
            None => ((0..coupling.num_qubits()).collect(), Cow::Borrowed(coupling)),
        };
        if num_logical as usize > usable.len() {
            return Err(MapperError::TooManyLogicalQubits {
                required: num_logical,
                available: usable.len() as u32,
            });
        }

        let circuit = Circuit::new(gates, num_logical, &device, self.latency.as_ref())?;
        let fixed = layout::caller_placed(config.initial_mapping.as_ref(), num_logical);
        let ctx = SearchContext::new(&circuit, &device, self.latency.as_ref(), &usable)
            .with_fixed(&fixed)
            .with_parallel(config.parallel_expansion);

        if device.components_among(&usable) > 1 {
            warn!("Coupling graph over the usable qubits is disconnected");
        }
        info!(
            "Routing {} gates on {} logical qubits over {} physical qubits ({}, {}, {}, {})",
            circuit.len(),
            num_logical,
            usable.len(),
            self.queue.name(),
            self.expander.name(),
            self.cost.name(),
            self.latency.name()
        );

        let layouts = match &config.initial_mapping {
            Some(mapping) => vec![layout::from_mapping(mapping, &ctx)?],
            None => layout::seed_layouts(&ctx, config.initial_search.is_enabled()),
        };

        let mut search = Search::new(self, &ctx);
        search.seed(layouts);
        search.run()
    }

    /// Route with an explicit initial mapping, leaving the stored
    /// configuration untouched.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_mapping(
        &self,
        gates: &[GateOp],
        num_logical: u32,
        coupling: &CouplingMap,
        mapping: InitialMapping,
    ) -> MapperResult<ToqmResult> {
        let mut mapper = self.clone();
        mapper.config.initial_mapping = Some(mapping);
        mapper.run(gates, num_logical, coupling)
    }
}

/// Per-run search state.
struct Search<'m, 'c, 'a> {
    mapper: &'m ToqmMapper,
    ctx: &'c SearchContext<'a>,
    queue: Box<dyn NodeQueue>,
    filters: Vec<Box<dyn Filter>>,
    arena: NodeArena,
    filter_stats: BTreeMap<String, u64>,
    /// Layouts already queued in the layout phase, with the largest
    /// free-swap budget seen for each.
    open_layouts: FxHashMap<Vec<u32>, Option<u32>>,
    popped: u64,
    best: Option<(u32, Cost, NodeId)>,
}

impl<'m, 'c, 'a> Search<'m, 'c, 'a> {
    fn new(mapper: &'m ToqmMapper, ctx: &'c SearchContext<'a>) -> Self {
        let filters: Vec<Box<dyn Filter>> = mapper.filters.iter().map(|f| f.clone_box()).collect();
        let filter_stats = filters.iter().map(|f| (f.name().to_string(), 0)).collect();
        Self {
            mapper,
            ctx,
            queue: mapper.queue.clone_box(),
            filters,
            arena: NodeArena::new(mapper.config.retain_popped),
            filter_stats,
            open_layouts: FxHashMap::default(),
            popped: 0,
            best: None,
        }
    }

    fn seed(&mut self, layouts: Vec<Vec<u32>>) {
        let ctx = self.ctx;
        let cost = self.mapper.cost.as_ref();
        let phase = self.mapper.config.initial_search.root_phase();
        let make = |laq: Vec<u32>| {
            let mut root = Node::root(ctx, laq, phase);
            if phase == LayoutPhase::Closed {
                root.flush(ctx);
            }
            root.set_cost(cost.cost(&root, ctx));
            root
        };

        let roots: Vec<Node> = if ctx.parallel && layouts.len() > 1 {
            layouts.into_par_iter().map(make).collect()
        } else {
            layouts.into_iter().map(make).collect()
        };
        debug!("Seeded {} root layouts", roots.len());
        for root in roots {
            self.admit(root);
        }
    }

    /// Filter, modify and queue a freshly built node.
    fn admit(&mut self, mut node: Node) {
        let id = self.arena.next_id();
        node.set_id(id);
        if node.cost().is_unreachable() {
            trace!("Node {} cannot reach a complete schedule", id);
            return;
        }
        if let LayoutPhase::Open { budget } = node.layout() {
            if !self.first_visit(node.laq(), budget) {
                trace!("Node {} repeats an explored layout", id);
                return;
            }
        }

        for filter in &mut self.filters {
            match filter.check(&node) {
                FilterVerdict::Reject => {
                    *self.filter_stats.entry(filter.name().to_string()).or_default() += 1;
                    return;
                }
                FilterVerdict::Accept { retire } => {
                    for stale in retire {
                        if self.queue.retire(stale) {
                            self.arena.discard(stale);
                            *self.filter_stats.entry(filter.name().to_string()).or_default() += 1;
                        }
                    }
                }
            }
        }

        let mut changed = false;
        for node_mod in &self.mapper.node_mods {
            changed |= node_mod.modify(&mut node, self.ctx);
        }
        if changed {
            node.set_cost(self.mapper.cost.cost(&node, self.ctx));
            if node.cost().is_unreachable() {
                return;
            }
        }

        let entry = QueueEntry::new(id, node.cost());
        self.arena.insert(node);
        for dropped in self.queue.push(entry) {
            self.arena.discard(dropped);
        }
    }

    /// Record a layout-phase node. Returns `false` if the same layout was
    /// already queued with at least as many free swaps left.
    fn first_visit(&mut self, laq: &[u32], budget: Option<u32>) -> bool {
        let Some(seen) = self.open_layouts.get_mut(laq) else {
            self.open_layouts.insert(laq.to_vec(), budget);
            return true;
        };
        let covered = match (*seen, budget) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(old), Some(new)) => new <= old,
        };
        if !covered {
            *seen = budget;
        }
        !covered
    }

    fn run(mut self) -> MapperResult<ToqmResult> {
        let started = Instant::now();
        let mapper = self.mapper;
        let ctx = self.ctx;
        let config = &mapper.config;

        loop {
            if self.budget_exhausted(started) {
                warn!("Search budget exhausted after {} pops", self.popped);
                let best = self.best;
                return match best {
                    Some((_, _, best)) if config.best_effort => self.finish(best, false),
                    _ => Err(MapperError::BudgetExhausted {
                        popped: self.popped,
                    }),
                };
            }

            let Some(entry) = self.queue.pop() else {
                warn!("Queue exhausted after {} pops", self.popped);
                return Err(MapperError::EmptyQueue {
                    popped: self.popped,
                });
            };
            self.popped += 1;
            let Some((terminal, remaining)) = self
                .arena
                .get(entry.node)
                .map(|node| (node.is_terminal(), node.remaining()))
            else {
                continue;
            };

            if terminal {
                return self.finish(entry.node, true);
            }
            if config.best_effort {
                self.track_best(entry.node, remaining, entry.cost);
            }
            if self.popped % config.progress_interval == 0 {
                self.report(entry.cost);
            }

            let children = match self.arena.get(entry.node) {
                Some(node) => mapper.expander.expand(node, ctx, mapper.cost.as_ref()),
                None => Vec::new(),
            };
            // Children dropped during admission must not free this node
            // while its later children still need it as a parent.
            for child in children {
                self.admit(child);
            }
            self.arena.mark_popped(entry.node);
            self.arena.release(entry.node);
        }
    }

    fn budget_exhausted(&self, started: Instant) -> bool {
        let budget = &self.mapper.config.budget;
        budget.max_popped.is_some_and(|max| self.popped >= max)
            || budget
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
    }

    /// Remember the most advanced popped node for best-effort results.
    fn track_best(&mut self, id: NodeId, remaining: u32, cost: Cost) {
        let candidate = (remaining, cost, id);
        if self.best.is_some_and(|best| best <= candidate) {
            return;
        }
        self.arena.pin(id);
        if let Some((_, _, previous)) = self.best.replace(candidate) {
            self.arena.unpin(previous);
        }
    }

    fn report(&self, cost: Cost) {
        let (popped, queued, stored) = (self.popped, self.queue.len(), self.arena.len());
        if self.mapper.config.verbose {
            info!(
                "Popped {} nodes; {} queued, {} stored; current cost {}",
                popped, queued, stored, cost
            );
        } else {
            debug!(
                "Popped {} nodes; {} queued, {} stored; current cost {}",
                popped, queued, stored, cost
            );
        }
    }

    fn finish(self, id: NodeId, terminal: bool) -> MapperResult<ToqmResult> {
        let node = self.arena.get(id).ok_or(MapperError::EmptyQueue {
            popped: self.popped,
        })?;
        let circuit = self.ctx.circuit;

        let mut scheduled_gates: Vec<ScheduledGateOp> = self
            .arena
            .history(id)?
            .into_iter()
            .map(|step| ScheduledGateOp {
                op: match step.op {
                    StepOp::Gate(gate) => ScheduledOp::Gate(circuit.gate(gate).clone()),
                    StepOp::Swap => ScheduledOp::Swap,
                },
                physical_target: step.physical_target,
                physical_control: step.physical_control,
                cycle: step.cycle,
                latency: step.latency,
            })
            .collect();
        scheduled_gates.sort_by_key(|g| g.cycle);

        info!(
            "Finished after {} pops: {} cycles ({} ideal), {} swaps{}",
            self.popped,
            node.makespan(),
            circuit.ideal_cycles(),
            node.num_swaps(),
            if terminal { "" } else { " (incomplete)" }
        );

        Ok(ToqmResult {
            scheduled_gates,
            remaining_in_queue: self.queue.len() as u64,
            num_physical_qubits: self.ctx.num_physical(),
            num_logical_qubits: circuit.num_logical(),
            initial_laq: node.start_laq().to_vec(),
            inferred_laq: node.laq().to_vec(),
            inferred_qal: node.qal().to_vec(),
            ideal_cycles: circuit.ideal_cycles(),
            cycles: node.makespan(),
            num_swaps: node.num_swaps(),
            num_popped: self.popped,
            nodes_created: self.arena.created(),
            nodes_retained: self.arena.len() as u64,
            filter_stats: self.filter_stats,
            terminal,
        })
    }
}
