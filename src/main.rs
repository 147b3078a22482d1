//! Solver binary entry point (spec.md §6): reads an input document, runs the
//! seed-parallel metaheuristic, and writes the result document.
//!
//! Grounded on `khx02-vrp/src/main.rs`'s `tracing_subscriber` setup and
//! exit-code-from-error-kind pattern.

use std::fs;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use vrp_core::cli::{exploration_params, Cli};
use vrp_core::compatibility::Compatibility;
use vrp_core::construction::{construct, ConstructionConfig, FALLBACK_TABLE};
use vrp_core::io::{build_output, parse_input, ComputingTimes};
use vrp_core::ls_engine::{optimize, Indicators};
use vrp_core::models::Input;
use vrp_core::routes::{RouteStep, TWRoute};
use vrp_core::solution::assemble_solution;
use vrp_core::solution_state::SolutionState;
use vrp_core::{ErrorKind, VrpError};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn read_input(cli: &Cli) -> Result<String, VrpError> {
    match &cli.input {
        Some(path) => fs::read_to_string(path).map_err(|e| VrpError::input(format!("cannot read {}: {e}", path.display()))),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| VrpError::input(format!("cannot read stdin: {e}")))?;
            Ok(buf)
        }
    }
}

fn write_output(cli: &Cli, text: &str) -> Result<(), VrpError> {
    match &cli.output {
        Some(path) => fs::write(path, text).map_err(|e| VrpError::input(format!("cannot write {}: {e}", path.display()))),
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
                .map_err(|e| VrpError::internal(format!("cannot write stdout: {e}")))
        }
    }
}

/// Runs one construction + local-search seed to a local optimum.
fn run_seed(
    input: &Input,
    compat: &Compatibility,
    seed_index: usize,
    depth: usize,
    deadline: Option<Instant>,
) -> (Vec<TWRoute>, SolutionState, Indicators) {
    tracing::debug!(seed_index, depth, "seed starting");
    let config: ConstructionConfig = FALLBACK_TABLE[seed_index % FALLBACK_TABLE.len()];
    let homogeneous = seed_index % 2 == 0;
    let (routes, state) = construct(input, compat, config, homogeneous);
    let (routes, state) = optimize(input, compat, routes, state, depth, deadline, true);
    let indicators = Indicators::compute(input, &state, &routes);
    tracing::debug!(seed_index, unassigned = state.unassigned().len(), "seed finished");
    (routes, state, indicators)
}

/// Check mode (spec.md §7 Infeasibility error): places each vehicle's
/// supplied `steps` directly, in order, without running local search, and
/// raises an `Infeasible` error as soon as a step cannot be feasibly added.
fn run_check(input: &Input) -> Result<(Vec<TWRoute>, SolutionState), VrpError> {
    let compat = Compatibility::build(input);
    let mut routes: Vec<TWRoute> = (0..input.vehicles().len())
        .map(|v| TWRoute::new(v, input.amount_size()))
        .collect();

    for (v, vehicle) in input.vehicles().iter().enumerate() {
        let Some(steps) = vehicle.steps() else { continue };
        for step in steps {
            let route_step = match step {
                vrp_core::models::VehicleStep::Job { id } | vrp_core::models::VehicleStep::Pickup { id } | vrp_core::models::VehicleStep::Delivery { id } => {
                    let rank = input
                        .jobs()
                        .iter()
                        .position(|j| j.id() == *id)
                        .ok_or_else(|| VrpError::input(format!("unknown job id {id} in vehicle {} steps", vehicle.id())))?;
                    Some(RouteStep::Job(rank))
                }
                vrp_core::models::VehicleStep::Break { id } => {
                    let idx = vehicle
                        .breaks()
                        .iter()
                        .position(|b| b.id() == *id)
                        .ok_or_else(|| VrpError::input(format!("unknown break id {id} in vehicle {} steps", vehicle.id())))?;
                    Some(RouteStep::Break(idx))
                }
                vrp_core::models::VehicleStep::Start | vrp_core::models::VehicleStep::End => None,
            };
            if let Some(rs) = route_step {
                let at = routes[v].size();
                if !routes[v].add(input, vehicle, rs, at) {
                    return Err(VrpError::infeasible(format!(
                        "vehicle {} cannot feasibly serve its prescribed step sequence",
                        vehicle.id()
                    )));
                }
            }
        }
    }

    let mut state = SolutionState::new(input);
    state.setup(input, &compat, &routes);
    Ok((routes, state))
}

fn run(cli: &Cli) -> Result<String, VrpError> {
    let load_start = Instant::now();
    let text = read_input(cli)?;
    let input = parse_input(&text)?;
    let loading_ms = load_start.elapsed().as_millis() as u64;

    if let Some(router) = &cli.router {
        tracing::info!(router, address = cli.address.as_deref(), port = cli.port, geometry = cli.geometry, "router collaborator requested (not invoked by the core)");
    }

    let solve_start = Instant::now();
    let (routes, state) = if cli.check {
        run_check(&input)?
    } else {
        let deadline = cli.timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        let (nb_searches, depth) = exploration_params(cli.exploration_level);
        let compat = Compatibility::build(&input);

        let nb_threads = cli.nb_threads.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads.max(1))
            .build()
            .map_err(|e| VrpError::internal(format!("failed to build thread pool: {e}")))?;

        let best = pool.install(|| {
            (0..nb_searches)
                .into_par_iter()
                .map(|seed| run_seed(&input, &compat, seed, depth, deadline))
                .min_by_key(|(_, _, indicators)| *indicators)
        });

        let (routes, state, _) = best.ok_or_else(|| VrpError::internal("no seed produced a solution"))?;
        (routes, state)
    };
    let solving_ms = solve_start.elapsed().as_millis() as u64;

    let unassigned: Vec<usize> = state.unassigned().iter().copied().collect();
    let solution = assemble_solution(&input, &routes, unassigned);

    let computing_times = ComputingTimes { loading: loading_ms, solving: solving_ms, routing: 0 };
    let doc = build_output(&input, &solution, 0, computing_times);
    serde_json::to_string_pretty(&doc).map_err(|e| VrpError::internal(format!("failed to serialize output: {e}")))
}

fn error_document(err: &VrpError) -> String {
    let body = serde_json::json!({ "code": err.kind().exit_code(), "error": err.message() });
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| format!("{{\"code\":{},\"error\":\"{}\"}}", err.kind().exit_code(), err.message()))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(text) => {
            if let Err(e) = write_output(&cli, &text) {
                tracing::error!(error = %e, "failed to write output");
                std::process::exit(e.kind().exit_code());
            }
        }
        Err(err) => {
            tracing::error!(error = %err, kind = ?err.kind(), "solve failed");
            let text = error_document(&err);
            let _ = write_output(&cli, &text);
            std::process::exit(err.kind().exit_code());
        }
    }
}
