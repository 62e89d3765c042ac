use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nodetree", about = "Inspect and edit nodetree data files", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Directory searched for `#include` files (repeatable)
    #[arg(
        long = "loadpath",
        short = 'L',
        global = true,
        env = "NODETREE_LOADPATH",
        value_delimiter = ','
    )]
    pub loadpaths: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print `path = value` for every value in a file
    Dump {
        /// File to read
        file: PathBuf,

        /// Prefix prepended to every path
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Print the value at a path
    Get {
        /// File to read
        file: PathBuf,

        /// Dotted path to look up
        path: String,

        /// Printed when the path has no value
        #[arg(long)]
        default: Option<String>,
    },

    /// Set a value and rewrite the file atomically (files using #include are refused)
    Set {
        /// File to update
        file: PathBuf,

        /// Dotted path to set
        path: String,

        /// New value
        value: String,
    },

    /// Print a file in canonical form
    Fmt {
        /// File to read
        file: PathBuf,
    },

    /// Print a file as JSON
    Json {
        /// File to read
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_get_with_default() {
        let cli =
            Cli::try_parse_from(["nodetree", "get", "a.hdf", "A.B", "--default", "x"]).unwrap();
        match cli.command {
            Commands::Get { file, path, default } => {
                assert_eq!(file, PathBuf::from("a.hdf"));
                assert_eq!(path, "A.B");
                assert_eq!(default.as_deref(), Some("x"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_loadpaths_are_global_and_delimited() {
        let cli = Cli::try_parse_from([
            "nodetree", "fmt", "a.hdf", "--loadpath", "one,two", "-L", "three",
        ])
        .unwrap();
        assert_eq!(
            cli.loadpaths,
            vec![PathBuf::from("one"), PathBuf::from("two"), PathBuf::from("three")]
        );
    }

    #[test]
    fn test_set_requires_value() {
        assert!(Cli::try_parse_from(["nodetree", "set", "a.hdf", "A"]).is_err());
    }
}
