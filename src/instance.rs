//! Minimal text format for a grid plus a set of agents (spec.md §6).
//!
//! ```text
//! <rows> <cols>
//! <rows lines of <cols> characters, '.' passable, '@' blocked>
//! <num_agents>
//! <num_agents lines of "sx sy gx gy", 0-indexed, row then column>
//! ```
//!
//! Benchmark/scenario formats, random instance generation, and any other
//! on-disk representation are outside this crate's scope; this is the one
//! format the library itself knows how to read.

use thiserror::Error;

use crate::grid::Grid;
use crate::highlevel::Agent;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("missing header line")]
    MissingHeader,

    #[error("invalid header line {0:?}: expected \"<rows> <cols>\"")]
    InvalidHeader(String),

    #[error("row {row} width mismatch: expected {expected}, got {got}")]
    RowWidthMismatch { row: usize, expected: usize, got: usize },

    #[error("map has {found} rows, header declared {declared}")]
    RowCountMismatch { declared: usize, found: usize },

    #[error("unrecognized map character {0:?}")]
    UnknownTile(char),

    #[error("missing agent count line")]
    MissingAgentCount,

    #[error("invalid agent count line {0:?}")]
    InvalidAgentCount(String),

    #[error("agent {index} line is malformed: {line:?}")]
    MalformedAgentLine { index: usize, line: String },

    #[error("agent {index} cell ({row}, {col}) is out of bounds or blocked")]
    AgentCellInvalid { index: usize, row: usize, col: usize },
}

pub struct Instance {
    pub grid: Grid,
    pub agents: Vec<Agent>,
}

impl Instance {
    pub fn parse(input: &str) -> Result<Self, InstanceError> {
        let mut lines = input.lines();

        let header = lines.next().ok_or(InstanceError::MissingHeader)?;
        let mut header_parts = header.split_whitespace();
        let rows: usize = header_parts
            .next()
            .ok_or_else(|| InstanceError::InvalidHeader(header.to_string()))?
            .parse()
            .map_err(|_| InstanceError::InvalidHeader(header.to_string()))?;
        let cols: usize = header_parts
            .next()
            .ok_or_else(|| InstanceError::InvalidHeader(header.to_string()))?
            .parse()
            .map_err(|_| InstanceError::InvalidHeader(header.to_string()))?;
        if header_parts.next().is_some() {
            return Err(InstanceError::InvalidHeader(header.to_string()));
        }

        let mut blocked = Vec::with_capacity(rows);
        for row in 0..rows {
            let line = lines
                .next()
                .ok_or(InstanceError::RowCountMismatch { declared: rows, found: row })?;
            // Trailing whitespace is tolerated (spec.md §6); only count real tiles.
            let chars: Vec<char> = line.trim_end().chars().collect();
            if chars.len() != cols {
                return Err(InstanceError::RowWidthMismatch {
                    row,
                    expected: cols,
                    got: chars.len(),
                });
            }
            let mut row_blocked = Vec::with_capacity(cols);
            for ch in chars {
                row_blocked.push(match ch {
                    '.' => false,
                    '@' => true,
                    other => return Err(InstanceError::UnknownTile(other)),
                });
            }
            blocked.push(row_blocked);
        }
        let grid = Grid::new(blocked);

        let count_line = lines.next().ok_or(InstanceError::MissingAgentCount)?;
        let count: usize = count_line
            .trim()
            .parse()
            .map_err(|_| InstanceError::InvalidAgentCount(count_line.to_string()))?;

        let mut agents = Vec::with_capacity(count);
        for index in 0..count {
            let line = lines
                .next()
                .ok_or(InstanceError::MalformedAgentLine { index, line: String::new() })?;
            let parts: Vec<usize> = line
                .split_whitespace()
                .map(|s| s.parse::<usize>())
                .collect::<Result<_, _>>()
                .map_err(|_| InstanceError::MalformedAgentLine {
                    index,
                    line: line.to_string(),
                })?;
            let [sx, sy, gx, gy]: [usize; 4] = parts.try_into().map_err(|_| {
                InstanceError::MalformedAgentLine {
                    index,
                    line: line.to_string(),
                }
            })?;

            for (row, col) in [(sx, sy), (gx, gy)] {
                if !grid.in_bounds((row, col)) || grid.is_blocked((row, col)) {
                    return Err(InstanceError::AgentCellInvalid { index, row, col });
                }
            }

            agents.push(Agent {
                start: (sx, sy),
                goal: (gx, gy),
            });
        }

        Ok(Instance { grid, agents })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_valid_instance() {
        let text = "2 2\n..\n..\n1\n0 0 1 1\n";
        let instance = Instance::parse(text).unwrap();
        assert_eq!(instance.grid.rows(), 2);
        assert_eq!(instance.grid.cols(), 2);
        assert_eq!(instance.agents.len(), 1);
        assert_eq!(instance.agents[0].start, (0, 0));
        assert_eq!(instance.agents[0].goal, (1, 1));
    }

    #[test]
    fn tolerates_trailing_whitespace_on_map_rows() {
        let text = "1 3\n.@. \n1\n0 0 0 2\n";
        let instance = Instance::parse(text).unwrap();
        assert!(instance.grid.is_blocked((0, 1)));
        assert_eq!(instance.agents[0].goal, (0, 2));
    }

    #[test]
    fn rejects_row_width_mismatch() {
        let text = "2 2\n.\n..\n0\n";
        let err = Instance::parse(text).unwrap_err();
        assert!(matches!(err, InstanceError::RowWidthMismatch { row: 0, .. }));
    }

    #[test]
    fn rejects_agent_starting_on_a_blocked_cell() {
        let text = "1 2\n@.\n1\n0 0 0 1\n";
        let err = Instance::parse(text).unwrap_err();
        assert!(matches!(err, InstanceError::AgentCellInvalid { index: 0, .. }));
    }

    #[test]
    fn rejects_unknown_tile_characters() {
        let text = "1 1\nx\n0\n";
        let err = Instance::parse(text).unwrap_err();
        assert!(matches!(err, InstanceError::UnknownTile('x')));
    }
}
