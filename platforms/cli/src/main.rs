use clap::Parser;
use log::{info, warn};
use std::error::Error;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use turbit::encoder::{encode_action, encode_tape};
use turbit::{
    analyze, decode_tape, FillPolicy, Filler, ProgramLoader, ProgramManager, Rule, Settings, Step,
    Symbol, TuringMachine,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  turbit-cli --rules increment.rules --tape 1011
  turbit-cli --program \"busy beaver (2 states)\" --debug
  cat invert.rules | turbit-cli --tape 0101 --fill off")]
struct Cli {
    /// The rule table file to execute, one `state symbol write move next` rule per line
    #[clap(short, long, conflicts_with = "program")]
    rules: Option<PathBuf>,

    /// Run a built-in program by name instead of a rule file
    #[clap(short, long)]
    program: Option<String>,

    /// The initial tape, e.g. 0110B
    #[clap(short, long)]
    tape: Option<String>,

    /// What new tape cells contain: blank, off, on or random
    #[clap(short, long)]
    fill: Option<FillPolicy>,

    /// Seed for random fills
    #[clap(long)]
    seed: Option<u64>,

    /// Stop after this many steps if the machine has not halted
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Settings file (JSON)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Write the final tape dump to this file
    #[clap(long)]
    dump: Option<PathBuf>,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// List the built-in programs and exit
    #[clap(short, long)]
    list: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        for program in turbit::PROGRAMS.iter() {
            println!("{:<24} {}", program.name, program.description);
        }
        return Ok(());
    }

    let mut settings = match &cli.config {
        Some(path) => ProgramLoader::load_settings(path)?,
        None => Settings::default(),
    };

    let (rules, program_tape) = load_rules(&cli, &mut settings)?;

    if let Some(fill) = cli.fill {
        settings.fill = fill;
    }
    if let Some(seed) = cli.seed {
        settings.seed = Some(seed);
    }
    if let Some(max_steps) = cli.max_steps {
        settings.max_steps = max_steps;
    }

    let tape = match (&cli.tape, program_tape) {
        (Some(text), _) => decode_tape(text)?,
        (None, Some(tape)) => tape,
        (None, None) => settings.tape()?,
    };

    for warning in analyze(&rules) {
        warn!("{}", warning);
    }

    let filler = match settings.seed {
        Some(seed) => Filler::with_seed(settings.fill, seed),
        None => Filler::new(settings.fill),
    };
    let mut machine = TuringMachine::with_filler(filler);
    machine.set_rules(rules);
    machine.seed_tape(&tape);

    info!(
        "running {} rules on {} cells, fill {}, limit {}",
        machine.rules().len(),
        tape.len(),
        settings.fill,
        settings.max_steps
    );

    let (steps, halted) = if cli.debug {
        run_verbose(&mut machine, settings.max_steps)
    } else {
        let run = machine.run(settings.max_steps);
        (run.steps, run.halted)
    };

    if halted {
        println!("Machine halted after {} steps.", steps);
    } else {
        println!("Step limit of {} reached.", settings.max_steps);
    }
    println!("State: {}", machine.state());
    println!("Head: {}", machine.head());
    println!("{}", encode_tape(machine.tape().iter()));

    // A lossy dump is reported by the loader's own warning.
    if let Some(path) = &cli.dump {
        ProgramLoader::save_dump(path, machine.tape().iter())?;
    }

    Ok(())
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Loads the rule table from a built-in program, a file, or piped stdin.
///
/// A built-in program also brings its own tape and fill policy.
fn load_rules(
    cli: &Cli,
    settings: &mut Settings,
) -> Result<(Vec<Rule>, Option<Vec<Symbol>>), Box<dyn Error>> {
    if let Some(name) = &cli.program {
        let program = ProgramManager::get_program_by_name(name)?;
        settings.fill = program.fill;
        return Ok((program.rules.clone(), Some(program.tape.clone())));
    }

    if let Some(path) = &cli.rules {
        return Ok((ProgramLoader::load_rules(path)?, None));
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok((ProgramLoader::load_rules_from_string(&buffer)?, None));
    }

    Err("no rules given: use --rules, --program, or pipe a rule table on stdin".into())
}

/// Steps one rule at a time, printing the machine after each applied rule.
fn run_verbose(machine: &mut TuringMachine, limit: usize) -> (usize, bool) {
    let print_state = |machine: &TuringMachine, steps: usize, action: &str| {
        println!(
            "Step: {}, State: {}, Head: {}, Action: {}, Tape: {}",
            steps,
            machine.state(),
            machine.head(),
            action,
            encode_tape(machine.tape().iter())
        );
    };

    print_state(machine, 0, "-");

    for steps in 1..=limit {
        match machine.step() {
            Step::Applied(rule) => print_state(machine, steps, &encode_action(&rule)),
            Step::Halt => return (steps - 1, true),
        }
    }

    (limit, false)
}
