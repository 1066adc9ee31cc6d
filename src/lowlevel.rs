use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, instrument, trace};

use crate::constraint::ConstraintTable;
use crate::grid::{Cell, Grid, HeuristicTable};

pub type Path = Vec<Cell>;

/// Expanded/generated node counters, aggregated by the high-level solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub hl_expanded: usize,
    pub hl_generated: usize,
    pub ll_expanded: usize,
    pub ll_generated: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct OpenEntry {
    f: usize,
    h: usize,
    seq: usize,
    cell: Cell,
    t: usize,
}

// Inverted comparisons turn `BinaryHeap` (a max-heap) into a min-heap: the
// entry with the smallest f, then smallest h, then earliest insertion wins.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn construct_path(trace: &HashMap<(Cell, usize), (Cell, usize)>, mut current: (Cell, usize)) -> Path {
    let mut path = vec![current.0];
    while let Some(&prev) = trace.get(&current) {
        path.push(prev.0);
        current = prev;
    }
    path.reverse();
    path
}

/// Time-expanded A* for a single agent honoring `table`.
///
/// State space is `(cell, timestep)`. The goal test requires both reaching
/// `goal` and having passed `table.max_t()`, since a later positive
/// constraint on this agent can force it away from the goal after it first
/// arrives (spec: the agent must be able to wait out, or route around,
/// anything scheduled for it past arrival).
#[instrument(skip_all, name = "low_level_a_star", fields(agent, start = ?start, goal = ?goal), level = "debug")]
#[allow(clippy::too_many_arguments)]
pub fn search(
    grid: &Grid,
    heuristics: &HeuristicTable,
    agent: usize,
    start: Cell,
    goal: Cell,
    table: &ConstraintTable,
    num_agents: usize,
    counters: &mut Counters,
) -> Option<Path> {
    let h0 = heuristics.distance(goal, start);
    if h0 == usize::MAX {
        debug!("goal unreachable from start, ignoring other agents");
        return None;
    }

    // Any bound that preserves completeness for satisfiable sub-instances is
    // acceptable (spec §4.3); this one scales with the free cells available
    // times the number of agents plus the longest constraint horizon.
    let free_cells = grid.free_cell_count().max(1);
    let upper = free_cells.saturating_mul(num_agents + table.max_t() + 1);

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<(Cell, usize)> = HashSet::new();
    let mut trace: HashMap<(Cell, usize), (Cell, usize)> = HashMap::new();
    let mut seq = 0usize;

    open.push(OpenEntry {
        f: h0,
        h: h0,
        seq,
        cell: start,
        t: 0,
    });
    seq += 1;

    while let Some(current) = open.pop() {
        if closed.contains(&(current.cell, current.t)) {
            continue;
        }
        trace!("expand ({:?}, {})", current.cell, current.t);
        counters.ll_expanded += 1;
        closed.insert((current.cell, current.t));

        if current.cell == goal && current.t >= table.max_t() {
            return Some(construct_path(&trace, (current.cell, current.t)));
        }

        if current.t >= upper {
            continue;
        }

        let next_t = current.t + 1;
        for next_cell in grid.neighbors(current.cell) {
            if closed.contains(&(next_cell, next_t)) {
                continue;
            }

            if let Some(required) = table.required_vertex(next_t) {
                if required != next_cell {
                    continue;
                }
            }
            if let Some((req_from, req_to)) = table.required_edge(next_t) {
                if !(req_from == current.cell && req_to == next_cell) {
                    continue;
                }
            }
            if table.is_vertex_forbidden(next_t, next_cell) {
                continue;
            }
            if table.is_edge_forbidden(next_t, current.cell, next_cell) {
                continue;
            }

            let h = heuristics.distance(goal, next_cell);
            if h == usize::MAX {
                continue;
            }

            counters.ll_generated += 1;
            open.push(OpenEntry {
                f: next_t + h,
                h,
                seq,
                cell: next_cell,
                t: next_t,
            });
            trace.insert((next_cell, next_t), (current.cell, current.t));
            seq += 1;
        }
    }

    debug!("no path satisfies constraints");
    None
}
