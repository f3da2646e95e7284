//! Command-line front end for puzzle sessions.
//!
//! Runs a headless session against the reference engine. Puzzles are JSON
//! files in the model's own naming; grids are JSON arrays of rows with `0`
//! for empty cells.
//!
//! # Usage
//!
//! ```sh
//! pencilmark solve puzzle.json --solver brute
//! pencilmark check puzzle.json grid.json
//! pencilmark validate puzzle.json grid.json --marks marks.json
//! pencilmark translate puzzle.json
//! ```
//!
//! Set `RUST_LOG=debug` to follow the session lifecycle.

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand, ValueEnum};
use pencilmark_core::{
    CellMarks, Constraints, Grid, SolverType, field_names::constraints_to_engine, grid_errors,
};
use pencilmark_engine::ReferenceEngine;
use pencilmark_session::{SessionController, SessionSettings, SignalHub, SolveTicket};
use serde::de::DeserializeOwned;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolverArg {
    Logical,
    Brute,
}

impl From<SolverArg> for SolverType {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Logical => Self::Logical,
            SolverArg::Brute => Self::Brute,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON settings file. Missing fields take their defaults.
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a puzzle from its givens.
    Solve {
        /// Puzzle file.
        puzzle: PathBuf,
        /// Solving strategy. Defaults to the configured one.
        #[arg(long, value_name = "KIND")]
        solver: Option<SolverArg>,
    },
    /// Ask the engine whether a grid is consistent and still solvable.
    Check {
        /// Puzzle file.
        puzzle: PathBuf,
        /// Grid file.
        grid: PathBuf,
    },
    /// List the cells of a grid that break a rule.
    Validate {
        /// Puzzle file.
        puzzle: PathBuf,
        /// Grid file.
        grid: PathBuf,
        /// Pencil marks file.
        #[arg(long, value_name = "FILE")]
        marks: Option<PathBuf>,
    },
    /// Print the puzzle in engine naming.
    Translate {
        /// Puzzle file.
        puzzle: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    better_panic::install();
    env_logger::init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => SessionSettings::load(path)?,
        None => SessionSettings::default(),
    };

    match args.command {
        Command::Solve { puzzle, solver } => {
            let mut session = mount(&puzzle, settings)?;
            let ticket = session.request_solve(solver.map(SolverType::from), Instant::now())?;
            let result = wait(&mut session, ticket)?;
            print_json(&result)?;
            log::info!("solved in {}s of session time", session.elapsed_seconds());
        }
        Command::Check { puzzle, grid } => {
            let mut session = mount(&puzzle, settings)?;
            let grid: Grid = read_json(&grid)?;
            let ticket = session.request_check(&grid, Instant::now())?;
            let result = wait(&mut session, ticket)?;
            print_json(&result)?;
        }
        Command::Validate {
            puzzle,
            grid,
            marks,
        } => {
            let constraints: Constraints = read_json(&puzzle)?;
            let grid: Grid = read_json(&grid)?;
            constraints.check_grid(&grid)?;
            let marks = marks
                .map(|path| read_json::<CellMarks>(&path))
                .transpose()?;
            let errors = grid_errors(
                settings.assist.check_errors,
                &constraints,
                &grid,
                marks.as_ref(),
            );
            print_json(&errors)?;
        }
        Command::Translate { puzzle } => {
            let constraints: Constraints = read_json(&puzzle)?;
            print_json(&constraints_to_engine(&constraints)?)?;
        }
    }
    Ok(())
}

fn mount(puzzle: &Path, settings: SessionSettings) -> Result<SessionController, Box<dyn Error>> {
    let constraints: Constraints = read_json(puzzle)?;
    let hub = SignalHub::new(true);
    Ok(SessionController::mount(
        &hub,
        Rc::new(constraints),
        settings,
        ReferenceEngine::new(),
        Instant::now(),
    ))
}

fn wait(
    session: &mut SessionController,
    mut ticket: SolveTicket,
) -> Result<pencilmark_session::SolveResult, Box<dyn Error>> {
    loop {
        session.update(Instant::now());
        if let Some(result) = ticket.try_take() {
            return Ok(result?);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let value = serde_json::from_str(&text)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    Ok(value)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
