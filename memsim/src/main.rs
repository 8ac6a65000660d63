use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use memlib::config::CacheConfig;
use memlib::error::SimError;
use memlib::io::map_trace_file;
use memlib::simulator::{AccessEvent, AccessKind, EventSink, Simulator};
use memlib::trace::{demo_trace, parse_trace};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Functional simulator for a set-associative cache over a flat memory"))]
struct Args {
    /// JSON cache configuration; the built-in geometry is used when omitted
    config: Option<String>,

    /// Text trace of R/W ops; the built-in demo trace is used when omitted
    trace: Option<String>,

    /// Emit per-access events as JSON lines instead of bracketed text
    #[arg(short, long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

/// Why the process is exiting. Usage problems exit 1; the two fatal
/// simulation errors keep their own codes so a driving script can tell a bad
/// geometry from a bad trace.
enum Failure {
    Usage(String),
    Sim(SimError),
}

impl Failure {
    fn code(&self) -> ExitCode {
        match self {
            Failure::Usage(_) => ExitCode::FAILURE,
            Failure::Sim(SimError::Configuration(_)) => ExitCode::from(100),
            Failure::Sim(SimError::InvalidAddress(_)) => ExitCode::from(200),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Usage(message) => write!(f, "{message}"),
            Failure::Sim(error) => write!(f, "{error}"),
        }
    }
}

/// Renders each access event to stdout as it happens, so an aborted run still
/// shows everything up to the fatal access
struct StdoutReporter {
    json: bool,
}

impl EventSink for StdoutReporter {
    fn record(&mut self, event: &AccessEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        } else {
            print!("{}", render_text(event));
        }
    }
}

fn render_text(event: &AccessEvent) -> String {
    let kind = match event.kind {
        AccessKind::Read => "read",
        AccessKind::Write => "write",
    };
    let outcome = if event.hit { "hit" } else { "miss" };
    let mut out = format!(
        "[addr={} index={} tag={}: {kind} {outcome}; word={} ({} - {})]\n",
        event.address, event.index, event.tag, event.word, event.range_start, event.range_end
    );
    match &event.recency {
        Some(tags) => {
            out.push('[');
            for tag in tags {
                out.push_str(&format!(" {tag} "));
            }
            out.push_str("]\n");
        }
        None => out.push_str(&format!("[ {} ]\n", event.tag)),
    }
    if event.kind == AccessKind::Write {
        out.push_str(&format!("[ {} ]\n", event.write_policy.label()));
    }
    out
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("{failure}");
            failure.code()
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let start = Instant::now();
    let config = match &args.config {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                Failure::Usage(format!("Couldn't open the config file at path {path}: {e}"))
            })?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| Failure::Usage(format!("Couldn't parse the config file: {e}")))?
        }
        None => CacheConfig::default(),
    };
    let trace = match &args.trace {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                Failure::Usage(format!("Couldn't open the trace file at path {path}: {e}"))
            })?;
            let bytes = map_trace_file(&file).map_err(Failure::Usage)?;
            parse_trace(&bytes).map_err(Failure::Usage)?
        }
        None => demo_trace(),
    };
    let mut simulator = Simulator::new(&config).map_err(Failure::Sim)?;
    let mut reporter = StdoutReporter { json: args.json };
    let summary = simulator.run(&trace, &mut reporter).map_err(Failure::Sim)?;
    println!(
        "{}",
        serde_json::to_string_pretty(summary)
            .map_err(|e| Failure::Usage(format!("Couldn't serialise the output {e}")))?
    );
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!(
            "Total execution time (includes initial parsing, configuration, and output): {}s",
            total_time.as_nanos() as f64 / 1e9
        )
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        println!("Unoccupied cache blocks: {}", simulator.unoccupied_block_count());
    }
    Ok(())
}
