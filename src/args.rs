use clap::{Parser, Subcommand};

/// Keeps the votes of a game jam and ranks the entries by pairwise majority.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The jam file. For more information about the file format, read the
    /// documentation of the pairwise_ranking crate.
    #[clap(short, long, value_parser, default_value = "jam.json")]
    pub config: String,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Computes the current standings.
    Standings {
        /// (file path, 'stdout' or empty) If specified, the summary of the standings will be
        /// written in JSON format to the given location. Setting this option overrides the
        /// output directory of the jam file.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference file containing the expected summary in JSON format. If
        /// provided, jamvote will check that the computed standings match the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Lists the votes, the voter statuses and the standings.
    Votes,
    /// Registers a new team.
    AddTeam {
        /// The name of the team.
        #[clap(long, value_parser)]
        name: String,
        /// (optional) The identifier of the team. A random one is generated if missing.
        #[clap(long, value_parser)]
        uuid: Option<String>,
    },
    /// Withdraws a team from the standings. Its votes are kept.
    Withdraw {
        /// The identifier of the team.
        #[clap(long, value_parser)]
        team: String,
    },
    /// Records a vote.
    Vote {
        /// The identifier of the voter.
        #[clap(long, value_parser)]
        client: String,
        /// (list of comma-separated team identifiers) The preferences, the favourite first.
        #[clap(long, value_parser, value_delimiter = ',', required = true)]
        choices: Vec<String>,
        /// (RFC 3339 date, optional) When the vote was cast. Defaults to now.
        #[clap(long, value_parser)]
        timestamp: Option<String>,
        /// (optional) participant, volunteer or visitor.
        #[clap(long, value_parser)]
        voter_status: Option<String>,
        /// (optional) How the voter heard about the jam.
        #[clap(long, value_parser)]
        discovery: Option<String>,
    },
    /// Archives the current jam and starts a new one.
    Archive {
        /// If passed, the teams and the votes of the current jam are kept.
        #[clap(long, takes_value = false)]
        keep: bool,
    },
    /// Lists the archived jams, or shows the standings of one of them.
    Archives {
        /// (optional) The identifier of an archived jam.
        #[clap(long, value_parser)]
        id: Option<String>,
    },
}
