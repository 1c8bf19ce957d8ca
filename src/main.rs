use clap::Parser;
use esengine::{EngineConfig, EngineError, Interpreter, STACK_SIZE};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "esengine", version, about = "An ECMAScript 5 interpreter")]
struct Cli {
    /// JavaScript file to execute
    file: Option<PathBuf>,

    /// Evaluate inline JavaScript
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Print the completion value of the program
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Start an interactive session (the default without FILE or --eval)
    #[arg(short = 'i', long = "repl")]
    repl: bool,

    /// Treat global code as strict mode code
    #[arg(long)]
    strict: bool,

    /// Allocations between garbage collection passes
    #[arg(long = "gc-threshold", default_value_t = EngineConfig::default().gc_threshold)]
    gc_threshold: usize,
}

impl Cli {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            strict: self.strict,
            gc_threshold: self.gc_threshold,
            ..EngineConfig::default()
        }
    }
}

fn execute_code(interp: &mut Interpreter, code: &str, print: bool) -> Result<(), EngineError> {
    let value = interp.evaluate(code)?;
    if print {
        println!("{}", interp.display_value(&value));
    }
    Ok(())
}

fn run_source(interp: &mut Interpreter, source: &str, print: bool) -> ExitCode {
    match execute_code(interp, source, print) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run_repl(interp: &mut Interpreter) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("esengine v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript expressions. Press Ctrl-D to exit.");

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match interp.evaluate(trimmed) {
                    Ok(value) => println!("{}", interp.display_value(&value)),
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(e) => {
                eprintln!("Read error: {e}");
                return ExitCode::from(1);
            }
        }
    }
    println!();
    ExitCode::SUCCESS
}

fn run(cli: &Cli) -> ExitCode {
    let mut interp = Interpreter::with_config(cli.config());
    if let Some(code) = &cli.eval {
        let status = run_source(&mut interp, code, cli.print);
        if !cli.repl {
            return status;
        }
    }

    if let Some(path) = &cli.file {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                return ExitCode::from(1);
            }
        };
        let status = run_source(&mut interp, &source, cli.print);
        if !cli.repl {
            return status;
        }
    }

    run_repl(&mut interp)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default()).init();
    let cli = Cli::parse();
    log::debug!("starting with strict={} gc_threshold={}", cli.strict, cli.gc_threshold);

    let worker = std::thread::Builder::new()
        .name("esengine-main".into())
        .stack_size(STACK_SIZE)
        .spawn(move || run(&cli));
    match worker {
        Ok(handle) => handle.join().unwrap_or_else(|_| ExitCode::from(1)),
        Err(e) => {
            eprintln!("Failed to start interpreter thread: {e}");
            ExitCode::from(1)
        }
    }
}
