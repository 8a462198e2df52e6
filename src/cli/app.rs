use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ibread")]
#[command(about = "Forensic reader for InnoDB tablespaces")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Memory-map data files instead of buffered reads
    #[arg(long, global = true)]
    pub mmap: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump one page: FIL header, checksum and type-specific structures
    Page {
        /// Data files making up the space, in order (comma-separated or repeated)
        #[arg(short, long = "system-space-file", value_delimiter = ',', required = true)]
        system_space_file: Vec<String>,

        /// Page number to dump
        #[arg(short, long, default_value_t = 7)]
        page: u64,

        /// Append a hex dump of the raw page bytes
        #[arg(long)]
        hex: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Summarize the system space and list the tables in its catalog
    SystemSpaces {
        /// Data files making up the system space, in order
        #[arg(short, long = "system-space-file", value_delimiter = ',', required = true)]
        system_space_file: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode the records of an index
    Records {
        /// Data files making up the system space, in order
        #[arg(short, long = "system-space-file", value_delimiter = ',', required = true)]
        system_space_file: Vec<String>,

        /// Table name as stored in SYS_TABLES (e.g. test/t1)
        #[arg(short, long, conflicts_with = "root", required_unless_present = "root")]
        table: Option<String>,

        /// Index name
        #[arg(short, long, default_value = "PRIMARY")]
        index: String,

        /// Root page number of the index, bypassing the catalog
        #[arg(long)]
        root: Option<u64>,

        /// File-per-table tablespace (.ibd) holding the index
        #[arg(long)]
        tablespace: Option<String>,

        /// Keep going past records that fail to decode
        #[arg(long = "skip-errors")]
        skip_errors: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}
