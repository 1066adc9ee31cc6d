use std::collections::{HashMap, HashSet};

use crate::grid::Cell;

/// A location a constraint can talk about: a single cell (vertex) or a
/// directed pair of adjacent cells (edge, "traverse from a to b").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loc {
    Vertex(Cell),
    Edge(Cell, Cell),
}

/// One constraint on one agent: forbid (negative) or require (positive)
/// being at `loc` at `timestep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub agent: usize,
    pub loc: Loc,
    pub timestep: usize,
    pub positive: bool,
}

/// A cell that can never occur on a real grid, used to mark a positive
/// constraint slot as unsatisfiable when two positive constraints disagree.
/// The low-level search simply never generates a move to this cell, so the
/// branch that produced the contradiction fails naturally instead of
/// needing a dedicated error path (spec: "detected by LL reporting no
/// path").
const POISON_CELL: Cell = (usize::MAX, usize::MAX);
const POISON_EDGE: (Cell, Cell) = (POISON_CELL, POISON_CELL);

/// Per-agent index of negative/positive constraints keyed by timestep.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTable {
    neg_vertex: HashMap<usize, HashSet<Cell>>,
    neg_edge: HashMap<usize, HashSet<(Cell, Cell)>>,
    pos_vertex: HashMap<usize, Cell>,
    pos_edge: HashMap<usize, (Cell, Cell)>,
    max_t: usize,
}

impl ConstraintTable {
    /// Build the table for `agent` out of the full constraint list; entries
    /// addressed to other agents are ignored.
    pub fn build(constraints: &[Constraint], agent: usize) -> Self {
        let mut table = ConstraintTable::default();

        for c in constraints.iter().filter(|c| c.agent == agent) {
            table.max_t = table.max_t.max(c.timestep);

            match (c.loc, c.positive) {
                (Loc::Vertex(cell), false) => {
                    table.neg_vertex.entry(c.timestep).or_default().insert(cell);
                }
                (Loc::Edge(from, to), false) => {
                    table
                        .neg_edge
                        .entry(c.timestep)
                        .or_default()
                        .insert((from, to));
                }
                (Loc::Vertex(cell), true) => {
                    table
                        .pos_vertex
                        .entry(c.timestep)
                        .and_modify(|existing| {
                            if *existing != cell {
                                *existing = POISON_CELL;
                            }
                        })
                        .or_insert(cell);
                }
                (Loc::Edge(from, to), true) => {
                    table
                        .pos_edge
                        .entry(c.timestep)
                        .and_modify(|existing| {
                            if *existing != (from, to) {
                                *existing = POISON_EDGE;
                            }
                        })
                        .or_insert((from, to));
                }
            }
        }

        table
    }

    pub fn max_t(&self) -> usize {
        self.max_t
    }

    pub fn is_vertex_forbidden(&self, timestep: usize, cell: Cell) -> bool {
        self.neg_vertex
            .get(&timestep)
            .is_some_and(|set| set.contains(&cell))
    }

    pub fn is_edge_forbidden(&self, timestep: usize, from: Cell, to: Cell) -> bool {
        self.neg_edge
            .get(&timestep)
            .is_some_and(|set| set.contains(&(from, to)))
    }

    pub fn required_vertex(&self, timestep: usize) -> Option<Cell> {
        self.pos_vertex.get(&timestep).copied()
    }

    pub fn required_edge(&self, timestep: usize) -> Option<(Cell, Cell)> {
        self.pos_edge.get(&timestep).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_t_spans_positive_and_negative_vertex_and_edge() {
        let constraints = vec![
            Constraint {
                agent: 0,
                loc: Loc::Vertex((1, 1)),
                timestep: 2,
                positive: false,
            },
            Constraint {
                agent: 0,
                loc: Loc::Edge((0, 0), (0, 1)),
                timestep: 9,
                positive: true,
            },
        ];
        let table = ConstraintTable::build(&constraints, 0);
        assert_eq!(table.max_t(), 9);
    }

    #[test]
    fn conflicting_positive_vertex_constraints_become_unsatisfiable() {
        let constraints = vec![
            Constraint {
                agent: 0,
                loc: Loc::Vertex((1, 1)),
                timestep: 3,
                positive: true,
            },
            Constraint {
                agent: 0,
                loc: Loc::Vertex((2, 2)),
                timestep: 3,
                positive: true,
            },
        ];
        let table = ConstraintTable::build(&constraints, 0);
        let required = table.required_vertex(3).unwrap();
        assert_ne!(required, (1, 1));
        assert_ne!(required, (2, 2));
    }

    #[test]
    fn constraints_for_other_agents_are_ignored() {
        let constraints = vec![Constraint {
            agent: 1,
            loc: Loc::Vertex((1, 1)),
            timestep: 2,
            positive: false,
        }];
        let table = ConstraintTable::build(&constraints, 0);
        assert!(!table.is_vertex_forbidden(2, (1, 1)));
    }
}
