use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::conflict::{all_first_conflicts, Collision};
use crate::constraint::{Constraint, ConstraintTable, Loc};
use crate::grid::{Grid, HeuristicTable};
use crate::lowlevel::{self, Counters, Path};
use crate::splitter::{self, SplitterKind};

/// Start and goal cell for one agent, indexed by position in the slice
/// passed to [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    pub start: crate::grid::Cell,
    pub goal: crate::grid::Cell,
}

/// How a [`solve`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A conflict-free path for every agent, jointly optimal under sum-of-costs.
    Success { paths: Vec<Path>, cost: usize },
    /// The constraint tree was exhausted without finding a solution.
    Unsolvable,
    /// `timeout` elapsed before a solution or exhaustion was reached.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub outcome: Outcome,
    pub counters: Counters,
    /// Number of pushed children whose replan set included an agent not
    /// directly named by the branch's own constraints — i.e. a disjoint
    /// positive branch whose new requirement clashed with a third party's
    /// existing path (spec §4.6 step 2, disjoint-positive).
    pub third_party_replans: usize,
}

struct HlNode {
    constraints: Vec<Constraint>,
    paths: Vec<Path>,
    collisions: Vec<Collision>,
    cost: usize,
    gen_id: usize,
}

impl PartialEq for HlNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
            && self.collisions.len() == other.collisions.len()
            && self.gen_id == other.gen_id
    }
}
impl Eq for HlNode {}

// Inverted so BinaryHeap (max-heap) pops the lexicographically smallest
// (cost, collision count, generation order) node first.
impl Ord for HlNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.collisions.len().cmp(&self.collisions.len()))
            .then_with(|| other.gen_id.cmp(&self.gen_id))
    }
}
impl PartialOrd for HlNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn sum_of_costs(paths: &[Path]) -> usize {
    paths.iter().map(|p| p.len() - 1).sum()
}

fn plan_one(
    grid: &Grid,
    heuristics: &HeuristicTable,
    agents: &[Agent],
    constraints: &[Constraint],
    agent: usize,
    counters: &mut Counters,
) -> Option<Path> {
    let table = ConstraintTable::build(constraints, agent);
    lowlevel::search(
        grid,
        heuristics,
        agent,
        agents[agent].start,
        agents[agent].goal,
        &table,
        agents.len(),
        counters,
    )
}

/// Does `path` already clash with the positive constraint `c` — by sitting
/// on the cell another agent is now required to occupy, or by crossing the
/// required edge (in either direction) at that timestep?
fn violates_positive(path: &Path, c: &Constraint) -> bool {
    let at = |t: usize| -> crate::grid::Cell {
        if t < path.len() {
            path[t]
        } else {
            *path.last().expect("path is never empty")
        }
    };

    match c.loc {
        Loc::Vertex(required) => at(c.timestep) == required,
        Loc::Edge(from, to) => {
            let prev = at(c.timestep.saturating_sub(1));
            let curr = at(c.timestep);
            // Clashes if this path already sits on the required edge's
            // origin at `timestep - 1` (colliding with the mandated
            // position there), is at the required destination at
            // `timestep`, or swaps across the same edge in reverse.
            prev == from || curr == to || (prev == to && curr == from)
        }
    }
}

/// Agents whose paths must be replanned after adding `branch` to `node`.
/// Every agent named directly in the branch's new constraints needs a fresh
/// path under the enlarged constraint set; a positive constraint can also
/// invalidate an unrelated agent's existing path, so any such "violator" is
/// replanned too.
fn agents_to_replan(node: &HlNode, branch: &[Constraint]) -> HashSet<usize> {
    let mut agents: HashSet<usize> = branch.iter().map(|c| c.agent).collect();

    for c in branch.iter().filter(|c| c.positive) {
        for (other, path) in node.paths.iter().enumerate() {
            if other == c.agent {
                continue;
            }
            if violates_positive(path, c) {
                agents.insert(other);
            }
        }
    }

    agents
}

fn build_root(
    grid: &Grid,
    heuristics: &HeuristicTable,
    agents: &[Agent],
    counters: &mut Counters,
) -> Option<HlNode> {
    let mut paths = Vec::with_capacity(agents.len());
    for agent in 0..agents.len() {
        let path = plan_one(grid, heuristics, agents, &[], agent, counters)?;
        paths.push(path);
    }
    let collisions = all_first_conflicts(&paths);
    let cost = sum_of_costs(&paths);
    Some(HlNode {
        constraints: Vec::new(),
        paths,
        collisions,
        cost,
        gen_id: 0,
    })
}

fn child_node(
    grid: &Grid,
    heuristics: &HeuristicTable,
    agents: &[Agent],
    parent: &HlNode,
    branch: Vec<Constraint>,
    gen_id: usize,
    counters: &mut Counters,
) -> Option<HlNode> {
    let mut constraints = parent.constraints.clone();
    for c in branch.iter().copied() {
        if !constraints.contains(&c) {
            constraints.push(c);
        }
    }

    let replan = agents_to_replan(parent, &branch);
    let mut paths = parent.paths.clone();
    for &agent in &replan {
        paths[agent] = plan_one(grid, heuristics, agents, &constraints, agent, counters)?;
    }

    let collisions = all_first_conflicts(&paths);
    let cost = sum_of_costs(&paths);
    Some(HlNode {
        constraints,
        paths,
        collisions,
        cost,
        gen_id,
    })
}

/// Run Conflict-Based Search to a sum-of-costs-optimal, conflict-free joint
/// plan for `agents` on `grid`.
///
/// `splitter` selects which of the three conflict-resolution strategies
/// (standard, disjoint, group) is used whenever a collision is split into
/// branches. `seed` makes the disjoint agent choice and group partitioning
/// reproducible. The search is aborted, returning [`Outcome::TimedOut`], if
/// `timeout` elapses before a solution is found or the tree is exhausted;
/// `None` runs the search to exhaustion with no wall-clock bound.
#[instrument(skip_all, fields(agents = agents.len(), splitter = ?splitter))]
pub fn solve(
    grid: &Grid,
    agents: &[Agent],
    splitter: SplitterKind,
    seed: u64,
    timeout: Option<Duration>,
) -> SolveReport {
    let started = Instant::now();
    let timed_out = |started: Instant| timeout.is_some_and(|t| started.elapsed() > t);
    let mut counters = Counters::default();
    let mut third_party_replans = 0usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let goals: Vec<_> = agents.iter().map(|a| a.goal).collect();
    let heuristics = HeuristicTable::build(grid, &goals);

    let root = match build_root(grid, &heuristics, agents, &mut counters) {
        Some(root) => root,
        None => {
            debug!("no individual path exists for at least one agent");
            return SolveReport {
                outcome: Outcome::Unsolvable,
                counters,
                third_party_replans,
            };
        }
    };

    let mut open = BinaryHeap::new();
    open.push(root);
    let mut next_gen_id = 1usize;

    while let Some(node) = open.pop() {
        if timed_out(started) {
            return SolveReport {
                outcome: Outcome::TimedOut,
                counters,
                third_party_replans,
            };
        }

        counters.hl_expanded += 1;

        if node.collisions.is_empty() {
            info!(cost = node.cost, "solution found");
            return SolveReport {
                outcome: Outcome::Success {
                    paths: node.paths,
                    cost: node.cost,
                },
                counters,
                third_party_replans,
            };
        }

        let collision = &node.collisions[0];
        let branches = splitter::split(splitter, collision, agents.len(), &mut rng);

        for branch in branches {
            if timed_out(started) {
                return SolveReport {
                    outcome: Outcome::TimedOut,
                    counters,
                    third_party_replans,
                };
            }
            let named: HashSet<usize> = branch.iter().map(|c| c.agent).collect();
            let replan = agents_to_replan(&node, &branch);
            if let Some(child) = child_node(grid, &heuristics, agents, &node, branch, next_gen_id, &mut counters) {
                if replan.len() > named.len() {
                    third_party_replans += 1;
                }
                counters.hl_generated += 1;
                next_gen_id += 1;
                open.push(child);
            }
        }
    }

    SolveReport {
        outcome: Outcome::Unsolvable,
        counters,
        third_party_replans,
    }
}
