// ABOUTME: CLI entry point: line-editing REPL and script runner

use clap::Parser;
use log::debug;
use mage::config;
use mage::env::Env;
use mage::error::Error;
use mage::eval::eval;
use mage::expand::expand;
use mage::macros::MacroTable;
use mage::namespace::{Namespace, NsRegistry};
use mage::reader::{read_str, Reader};
use mage::repl::MageHelper;
use mage::symbol::Symbol;
use mage::value::Value;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Mage: a Clojure-flavored Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "mage")]
#[command(version = config::VERSION)]
#[command(about = "A Clojure-flavored Lisp interpreter")]
struct CliArgs {
    /// Script file to execute (starts the REPL when omitted)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate one expression, print its result, and exit
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    expr: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = CliArgs::parse();

    let registry = NsRegistry::new();
    let mut macro_table = MacroTable::new();
    let repl_ns = registry.find_or_create(&Symbol::new("user"));

    if let Some(source) = args.expr {
        if let Some(form) = read_str(&source)? {
            let result = eval_form(&form, &repl_ns, &mut macro_table, &registry)?;
            println!("{}", result);
        }
        return Ok(());
    }

    if let Some(script) = args.script {
        run_script(&script, &repl_ns, &mut macro_table, &registry)?;
        return Ok(());
    }

    run_repl(repl_ns, macro_table, registry)
}

/// One form through the pipeline: expand against the namespace's macro view,
/// then evaluate.
fn eval_form(
    form: &Value,
    ns: &Rc<Namespace>,
    macro_table: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    let expanded = expand(form, ns, macro_table, registry)?;
    eval(expanded, Env::Namespace(Rc::clone(ns)), registry)
}

/// Read and evaluate every top-level form of a script, stopping at the
/// first error.
fn run_script(
    path: &Path,
    ns: &Rc<Namespace>,
    macro_table: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read script file {}: {}", path.display(), e))?;
    debug!("loading script {}", path.display());

    let mut reader = Reader::new(&contents);
    while let Some(form) = reader.read(false)? {
        eval_form(&form, ns, macro_table, registry)?;
    }

    Ok(())
}

fn run_repl(
    repl_ns: Rc<Namespace>,
    mut macro_table: MacroTable,
    registry: NsRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<MageHelper, DefaultHistory> =
        Editor::with_config(config).map_err(|e| format!("Failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(MageHelper::new(Rc::clone(&repl_ns))));

    let history = history_path();
    if let Some(ref history) = history {
        if let Err(e) = ensure_history_file(history) {
            debug!("could not create history file {}: {}", history.display(), e);
        }
        let _ = rl.load_history(history);
    }

    println!("{} {}\n", config::WELCOME_MESSAGE, config::VERSION);

    let prompt = format!("{}=> ", repl_ns);
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    println!("{}", config::GOODBYE_MESSAGE);
                    break;
                }

                match read_str(&line) {
                    Ok(Some(form)) => {
                        match eval_form(&form, &repl_ns, &mut macro_table, &registry) {
                            Ok(result) => println!("{}", result),
                            Err(e) => eprintln!("Error: {}", e),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", config::GOODBYE_MESSAGE);
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    if let Some(ref history) = history {
        let _ = rl.save_history(history);
    }

    Ok(())
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(config::HISTORY_FILE_NAME))
}

/// Create the history file on first run, mode 0640.
fn ensure_history_file(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }

    std::fs::File::create(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(config::HISTORY_FILE_MODE))?;
    }
    Ok(())
}
