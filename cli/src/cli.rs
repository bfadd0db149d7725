use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use cumeets_business::Role;

#[derive(Parser)]
#[command(name = "cumeets")]
#[command(about = "Browse the CU Meets alumni and student directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List people in the directory
    List {
        /// Which half of the directory to show
        #[arg(long, short = 'r', value_enum, default_value_t = RoleArg::Alumni)]
        role: RoleArg,

        /// Search by name, major or graduation year
        #[arg(long, short = 'q', default_value = "")]
        query: String,

        /// Keep listening and re-render on every change (Ctrl-C to stop)
        #[arg(long, short = 'w')]
        watch: bool,

        /// Use built-in sample data instead of Firestore
        #[arg(long)]
        demo: bool,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Seconds to wait for the first snapshot
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Alumni,
    Student,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Alumni => Self::Alumni,
            RoleArg::Student => Self::Student,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_defaults() {
        let cli = Cli::try_parse_from(["cumeets", "list"]).expect("should parse");
        match cli.command {
            Commands::List {
                role,
                query,
                watch,
                demo,
                format,
                timeout,
            } => {
                assert_eq!(role, RoleArg::Alumni);
                assert!(query.is_empty());
                assert!(!watch);
                assert!(!demo);
                assert_eq!(format, OutputFormat::Table);
                assert_eq!(timeout, 30);
            }
            Commands::Completions { .. } => panic!("expected list"),
        }
    }

    #[test]
    fn list_with_flags() {
        let cli = Cli::try_parse_from([
            "cumeets", "list", "--role", "student", "-q", "cs", "--demo", "-f", "json",
        ])
        .expect("should parse");
        let Commands::List {
            role,
            query,
            demo,
            format,
            ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(Role::from(role), Role::Student);
        assert_eq!(query, "cs");
        assert!(demo);
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Cli::try_parse_from(["cumeets", "list", "--role", "faculty"]).is_err());
    }
}
