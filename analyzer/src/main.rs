use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use ufa::message::{MavlinkSpec, MessageDefinitions};
use ufa::pool::{self, PoolOptions};
use ufa::walker::WalkOptions;
use ufa::{compdb, dimension::UnitTable, interproc, message, priors};

#[derive(Parser, Debug)]
#[command(
    name = "ufa",
    version,
    about = "Unit & frame analyzer — finds unit-of-measure and coordinate-frame errors in C/C++ flight software"
)]
struct Cli {
    /// Directory containing the compilation database
    #[arg(short = 'c', long = "compilation-database")]
    compilation_database: PathBuf,

    /// XML message definitions; supported dialects are MAVLink and MDM
    #[arg(short = 'm', long = "message-definition")]
    message_definition: PathBuf,

    /// JSON file describing previously known variable types
    #[arg(short = 'p', long = "prior-types")]
    prior_types: PathBuf,

    /// Worker thread count (defaults to the number of hardware threads)
    #[arg(long)]
    jobs: Option<usize>,

    /// Append each canonical member-store target to this file (debugging aid)
    #[arg(long)]
    dump_writes: Option<PathBuf>,

    /// Enable verbose trace output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version render on stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let level = if cli.verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // load data sources; all unit IDs are allocated here, before the
    // workers start
    let mut units = UnitTable::new();
    let definitions = message::load_message_definitions(&cli.message_definition, &mut units)?;
    let vars = priors::load_prior_types(&cli.prior_types)?;
    let prior_types = priors::vars_to_typeinfo(&vars, &mut units);
    let interesting_writes: BTreeSet<String> =
        vars.iter().map(|v| v.variable_name.clone()).collect();
    let commands = compdb::load_compilation_database(&cli.compilation_database)?;

    let (mavlink, return_types) = match definitions {
        MessageDefinitions::Mavlink(spec) => (spec, HashMap::new()),
        MessageDefinitions::Methods(spec) => (MavlinkSpec::default(), spec.return_types),
    };

    let outcome = pool::run_pool(
        &commands,
        &mavlink,
        &prior_types,
        &interesting_writes,
        &units,
        return_types,
        &WalkOptions {
            dump_writes: cli.dump_writes,
        },
        &PoolOptions { jobs: cli.jobs },
    );

    println!("===DIAGNOSTICS===");
    println!("functions with intrinsic variables: ");
    for function in &outcome.tables.intrinsic_fns {
        println!("{}", function);
    }
    for trace in interproc::unconstrained_traces(&outcome.tables) {
        println!("{}", trace.join(" -> "));
    }

    Ok(())
}
