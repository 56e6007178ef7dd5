use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::{Builder, Env};
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rlox_tw as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::{Interpreter, InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
use lox::parser::Parser;
use lox::scanner::scan_tokens;
use lox::session::{Session, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Tree-walking Lox interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is given
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,

    /// Nested calls allowed before reporting a stack overflow
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Module path and source line on every record; RUST_LOG overrides the level.
    Builder::from_env(Env::default().default_filter_or("debug"))
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rlox_tw::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn interpreter(config: InterpreterConfig) -> Interpreter {
    Interpreter::new().with_config(config)
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    for e in &errors {
        debug!("Tokenization debug: {}", e);
        eprintln!("{}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(if errors.is_empty() { 0 } else { EXIT_STATIC_ERROR })
}

fn parse(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, lex_errors) = scan_tokens(&source);

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => {
            println!("{}", AstPrinter::print(&expr));
            Ok(0)
        }
        Ok(_) => {
            lex_errors.iter().for_each(|e| eprintln!("{}", e));
            Ok(EXIT_STATIC_ERROR)
        }
        Err(errors) => {
            lex_errors
                .iter()
                .chain(errors.iter())
                .for_each(|e| eprintln!("{}", e));
            Ok(EXIT_STATIC_ERROR)
        }
    }
}

fn evaluate(filename: &Path, config: InterpreterConfig) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, lex_errors) = scan_tokens(&source);

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => expr,
        Ok(_) => {
            lex_errors.iter().for_each(|e| eprintln!("{}", e));
            return Ok(EXIT_STATIC_ERROR);
        }
        Err(errors) => {
            lex_errors
                .iter()
                .chain(errors.iter())
                .for_each(|e| eprintln!("{}", e));
            return Ok(EXIT_STATIC_ERROR);
        }
    };

    match interpreter(config).evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(EXIT_RUNTIME_ERROR)
        }
    }
}

fn run_file(filename: &Path, config: InterpreterConfig) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::with_interpreter(interpreter(config));

    match session.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }
        Err(failure) => {
            debug!("Run failed: {:?}", failure);
            eprintln!("{}", failure);
            Ok(failure.exit_code())
        }
    }
}

/// Line-at-a-time prompt.  Definitions persist between lines; errors do not.
fn run_prompt(config: InterpreterConfig) -> Result<i32> {
    let mut session = Session::with_interpreter(interpreter(config));
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if let Err(e) = editor.add_history_entry(line.as_str()) {
                    debug!("Could not record history entry: {}", e);
                }

                if let Err(failure) = session.run(&line) {
                    eprintln!("{}", failure);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    info!("Prompt closed");
    Ok(0)
}

fn dispatch(args: Cli) -> Result<i32> {
    let config = InterpreterConfig {
        max_call_depth: args.max_call_depth,
    };

    match args.command {
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),
        Some(Commands::Parse { filename }) => parse(&filename),
        Some(Commands::Evaluate { filename }) => evaluate(&filename, config),
        Some(Commands::Run { filename }) => run_file(&filename, config),
        None => match args.script {
            Some(script) => run_file(&script, config),
            None => run_prompt(config),
        },
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // A minimal logger avoids "no logger" noise.
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = dispatch(args)?;

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
