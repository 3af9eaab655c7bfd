use std::{fs, io, path::PathBuf, str::FromStr};

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Extract bibliographic resources from AWOL blog posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output; repeat for more. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract the resources described by one or more Atom entries
    Parse {
        /// Extraction tables to use instead of the built-in ones
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Fetch structured records from known bibliographic sources
        #[arg(long)]
        enrich: bool,
        /// Write one JSON file per resource under this directory instead of printing
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long)]
        progress: bool,
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
    },
    /// Show the domains each post links to and the parser chosen for it
    Domains {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
    },
    /// Merge two resource records
    Merge {
        #[arg(value_name = "LEFT")]
        left: PathBuf,
        #[arg(value_name = "RIGHT")]
        right: PathBuf,
    },
}

/// An Atom file, or a directory holding them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Dir(PathBuf),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = fs::canonicalize(s).map_err(|e| format!("{s}: {e}"))?;
        if path.is_dir() {
            Ok(Source::Dir(path))
        } else {
            Ok(Source::File(path))
        }
    }
}

impl Source {
    /// The files this source stands for, sorted. Directories are walked for `*.xml`.
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        let root = match self {
            Source::File(path) => return Ok(vec![path.clone()]),
            Source::Dir(path) => path,
        };
        let mut files = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|e| e == "xml") {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
