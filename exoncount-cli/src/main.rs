mod count;
mod cutpoints;

use anyhow::Result;
use clap::{ArgAction, ArgMatches, Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "exoncount";
    pub const BIN_NAME: &str = "exoncount";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Count RNA-seq reads over gene exons and summarise alignment quality across samples.")
        .subcommand_required(true)
        .arg(arg!(-v --verbose "Log debug messages").global(true).action(ArgAction::SetTrue))
        .arg(arg!(-q --quiet "Only log warnings and errors, hide progress").global(true).action(ArgAction::SetTrue))
        .subcommand(count::cli::create_count_cli())
        .subcommand(cutpoints::cli::create_cutpoints_cli())
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("verbose") {
        "debug"
    } else if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(&matches);

    match matches.subcommand() {
        //
        // COUNT
        //
        Some((count::cli::COUNT_CMD, matches)) => {
            count::handlers::run_count(matches)?;
        }

        //
        // CUT-POINTS
        //
        Some((cutpoints::cli::CUTPOINTS_CMD, matches)) => {
            cutpoints::handlers::run_cutpoints(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
