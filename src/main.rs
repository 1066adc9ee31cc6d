use std::env;
use std::fs;
use std::time::Duration;

use anyhow::{bail, Context};
use cbs_mapf::{solve, Instance, Outcome, SplitterKind};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => bail!("usage: cbs_mapf <instance-file> [standard|disjoint|group] [seed] [timeout-seconds|none]"),
    };
    let splitter = match args.next().as_deref() {
        None | Some("standard") => SplitterKind::Standard,
        Some("disjoint") => SplitterKind::Disjoint,
        Some("group") => SplitterKind::Group,
        Some(other) => bail!("unknown splitter {other:?}"),
    };
    let seed: u64 = match args.next() {
        Some(s) => s.parse().context("seed must be a u64")?,
        None => 0,
    };
    let timeout = match args.next().as_deref() {
        None => Some(Duration::from_secs(30)),
        Some("none") => None,
        Some(secs) => Some(Duration::from_secs(
            secs.parse().context("timeout must be a number of seconds or \"none\"")?,
        )),
    };

    let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let instance = Instance::parse(&text).with_context(|| format!("parsing {path}"))?;

    let report = solve(&instance.grid, &instance.agents, splitter, seed, timeout);

    match report.outcome {
        Outcome::Success { paths, cost } => {
            println!("cost {cost}");
            for (agent, path) in paths.iter().enumerate() {
                let cells: Vec<String> = path.iter().map(|c| format!("({},{})", c.0, c.1)).collect();
                println!("agent {agent}: {}", cells.join(" -> "));
            }
        }
        Outcome::Unsolvable => println!("no solution exists"),
        Outcome::TimedOut => println!("timed out"),
    }
    println!(
        "high-level: {} expanded / {} generated; low-level: {} expanded / {} generated",
        report.counters.hl_expanded,
        report.counters.hl_generated,
        report.counters.ll_expanded,
        report.counters.ll_generated,
    );

    Ok(())
}
