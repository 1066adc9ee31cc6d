//! Conflict-Based Search for multi-agent path finding on a 4-connected grid.
//!
//! The high-level search ([`highlevel::solve`]) resolves pairwise conflicts
//! between single-agent shortest paths by branching a constraint tree;
//! each branch re-runs the low-level time-expanded A* ([`lowlevel::search`])
//! for the agents it constrains. Three branching strategies are available
//! through [`splitter::SplitterKind`].

pub mod conflict;
pub mod constraint;
pub mod grid;
pub mod highlevel;
pub mod instance;
pub mod lowlevel;
pub mod splitter;

pub use conflict::Collision;
pub use constraint::{Constraint, ConstraintTable, Loc};
pub use grid::{Cell, Grid, HeuristicTable};
pub use highlevel::{solve, Agent, Outcome, SolveReport};
pub use instance::{Instance, InstanceError};
pub use lowlevel::{Counters, Path};
pub use splitter::SplitterKind;
