mod args;
mod jam;

use clap::Parser;
use env_logger::Env;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::jam::*;

fn run(args: Args) -> JamResult<()> {
    let config = args.config.as_str();
    match args.command {
        Command::Standings { out, reference } => run_standings(config, out, reference),
        Command::Votes => run_votes_report(config),
        Command::AddTeam { name, uuid } => run_add_team(config, uuid, &name),
        Command::Withdraw { team } => run_withdraw(config, &team),
        Command::Vote {
            client,
            choices,
            timestamp,
            voter_status,
            discovery,
        } => run_vote(config, &client, timestamp, &choices, voter_status, discovery),
        Command::Archive { keep } => run_archive(config, keep),
        Command::Archives { id } => run_archives(config, id),
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = run(args) {
        eprintln!("An error occured: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
