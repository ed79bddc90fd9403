use std::path::PathBuf;

use clap::Parser;

use kvtables_cli::{commands, config, Command, CliError};

/// kvtables - tables of records in a key-value directory
#[derive(Parser, Debug)]
#[command(name = "kvtables")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the records [default: platform data dir]/kvtables
    #[arg(long, env = "KVTABLES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON schema describing the tables
    #[arg(long, env = "KVTABLES_SCHEMA")]
    schema: PathBuf,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => config::default_data_dir().ok_or(CliError::NoDataDir)?,
    };
    let mut db = config::open_database(&data_dir, &args.schema)?;

    if let Some(output) = commands::execute(&mut db, &args.command)? {
        println!("{}", commands::render(&output)?);
    }
    Ok(())
}
