use std::ffi::OsString;

pub use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ClapArgs {
    /// Profile name
    /// Profile section to read from the profile file. Default is 'default'.
    /// If the profile is not configured, built-in defaults are used.
    #[clap(short = 'p', long, default_value = "default", help = "profile name")]
    profile: String,

    /// Verbose mode
    /// Optional. Print debug logs to stderr.
    #[clap(
        short = 'v',
        long,
        help = "Print verbose message",
        default_value = "false"
    )]
    verbose: bool,

    /// Skip the network and read the saved catalog only
    #[clap(long, help = "Use the saved catalog without touching the network")]
    offline: bool,

    /// Emit JSON lines instead of a table
    #[clap(long, help = "Print JSON lines")]
    json: bool,

    #[command(subcommand)]
    command: Option<ClapCommand>,
}

#[derive(Subcommand, Debug)]
enum ClapCommand {
    /// List upcoming movies, optionally filtered by title
    List {
        /// Case-insensitive title search
        query: Option<String>,
    },
    /// Show one movie in detail
    Show {
        /// Catalog id of the movie
        id: u64,
    },
    /// Report whether the catalog host is reachable
    Status,
    /// Keep running and re-list on every connectivity change
    Watch {
        /// Seconds between reachability checks
        #[clap(long, default_value = "5")]
        interval: u64,
        /// Case-insensitive title search
        query: Option<String>,
    },
}

/// What the user asked the program to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { query: String },
    Show { id: u64 },
    Status,
    Watch { interval_secs: u64, query: String },
}

impl Command {
    fn from_clap(command: Option<ClapCommand>) -> Self {
        match command {
            None => Command::List {
                query: String::new(),
            },
            Some(ClapCommand::List { query }) => Command::List {
                query: query.unwrap_or_default(),
            },
            Some(ClapCommand::Show { id }) => Command::Show { id },
            Some(ClapCommand::Status) => Command::Status,
            Some(ClapCommand::Watch { interval, query }) => Command::Watch {
                interval_secs: interval.max(1),
                query: query.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    profile: String,
    verbose: bool,
    offline: bool,
    json: bool,
    command: Command,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            profile: args.profile,
            verbose: args.verbose,
            offline: args.offline,
            json: args.json,
            command: Command::from_clap(args.command),
        }
    }

    pub fn profile(&self) -> &String {
        &self.profile
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn offline(&self) -> bool {
        self.offline
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}
