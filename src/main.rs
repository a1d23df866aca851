use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::tokenize;
use rox::stmt::Stmt;
use rox::{Lox, Reporter, StderrReporter};

/// Exit status for lexical, syntax and resolution errors.
const EXIT_STATIC_ERROR: u8 = 65;
/// Exit status for a runtime error.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token list as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a program and prints the AST of each statement
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads a whole script as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source: String = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize_command(source: &str, json: bool) -> Result<ExitCode> {
    info!("Running Tokenize subcommand");

    let (tokens, errors) = tokenize(source);
    let mut reporter = StderrReporter::new(source);

    // Lexical errors go out first so stdout stays a clean token stream.
    for e in &errors {
        debug!("Tokenization debug: {}", e);
        reporter.error(e);
    }

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialise tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    info!("Tokenization completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn parse_command(source: &str) -> Result<ExitCode> {
    info!("Running Parse subcommand");

    let (tokens, lex_errors) = tokenize(source);
    let mut parser = Parser::new(tokens);
    let statements: Vec<Stmt> = parser.parse();

    let mut reporter = StderrReporter::new(source);
    let mut failed: bool = false;

    for e in lex_errors.iter().chain(parser.errors()) {
        debug!("Parse debug: {}", e);
        reporter.error(e);
        failed = true;
    }

    if failed {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    for stmt in &statements {
        let ast_str: String = match stmt {
            Stmt::Expression(expr) => AstPrinter::print(expr),
            other => AstPrinter::print_stmt(other),
        };

        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
    Ok(ExitCode::SUCCESS)
}

fn run_command(source: &str) -> ExitCode {
    info!("Running Run subcommand");
    debug!("Provided input:\n {}", source);

    let mut lox = Lox::new();
    let report = lox.run(source);

    report.emit(&mut StderrReporter::new(source));

    if report.had_error() {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else if report.had_runtime_error() {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        info!("Program executed successfully");
        ExitCode::SUCCESS
    }
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let source: String = read_file(&filename)?;
            tokenize_command(&source, json)
        }

        Commands::Parse { filename } => {
            let source: String = read_file(&filename)?;
            parse_command(&source)
        }

        Commands::Run { filename } => {
            let source: String = read_file(&filename)?;
            Ok(run_command(&source))
        }
    }
}
