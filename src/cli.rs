//! Command-line flag surface (spec.md §6 External Interfaces).
//!
//! Mirrors `janinge-drones2`'s `clap` derive usage — the only pack repo
//! building a `clap`-based CLI rather than hand-rolled `std::env::args`
//! parsing.

use std::path::PathBuf;

use clap::Parser;

/// Metaheuristic solver for capacitated, time-windowed, multi-depot vehicle
/// routing problems with pickup-and-delivery.
#[derive(Debug, Parser)]
#[command(name = "solver", version, about)]
pub struct Cli {
    /// Input JSON file. Reads stdin if omitted.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output JSON file. Writes stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Exploration level (0..=5): higher spends more seeds and LS depth.
    #[arg(short = 'x', long = "exploration-level", default_value_t = 5)]
    pub exploration_level: u8,

    /// Worker thread count for the seed fan-out (spec.md §5). Defaults to
    /// the available parallelism.
    #[arg(short = 't', long = "threads")]
    pub nb_threads: Option<usize>,

    /// Overall time budget in milliseconds. Unbounded if omitted.
    #[arg(short = 'l', long = "timeout")]
    pub timeout_ms: Option<u64>,

    /// Request route geometry on the output (external ETA/geometry
    /// collaborator; this core never computes it itself, spec.md §1).
    #[arg(short = 'g', long = "geometry")]
    pub geometry: bool,

    /// Check mode: validate the vehicles' supplied `steps` instead of
    /// searching for a new assignment.
    #[arg(short = 'c', long = "check")]
    pub check: bool,

    /// Router profile name passed through to the external matrix-provisioning
    /// collaborator (spec.md §1/§5); unused when `matrices` are supplied
    /// directly in the input document.
    #[arg(short = 'r', long = "router")]
    pub router: Option<String>,

    /// Router collaborator host[:port].
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,

    /// Router collaborator port, if not embedded in `--address`.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

/// `(nb_searches, depth)` for an exploration level (spec.md §6): `depth`
/// equals the level directly; `nb_searches` starts at `4 * (level + 1)` and
/// gains another `+4` once the level reaches 4, and a further `+4` at the
/// maximum level (5).
pub fn exploration_params(level: u8) -> (usize, usize) {
    let level = level.min(5);
    let mut nb_searches = 4 * (level as usize + 1);
    if level >= 4 {
        nb_searches += 4;
    }
    if level == 5 {
        nb_searches += 4;
    }
    (nb_searches, level as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exploration_params_table() {
        assert_eq!(exploration_params(0), (4, 0));
        assert_eq!(exploration_params(3), (16, 3));
        assert_eq!(exploration_params(4), (24, 4));
        assert_eq!(exploration_params(5), (32, 5));
    }
}
