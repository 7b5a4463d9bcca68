use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Molecular formula, e.g. C2H6O1 (will over-write the config file)
    #[arg(short, long)]
    pub formula: Option<String>,

    /// Amino acid sequence (will over-write the config file)
    #[arg(long)]
    pub fasta: Option<String>,

    /// File with one formula per line (will over-write the config file)
    #[arg(long)]
    pub formula_file: Option<PathBuf>,

    /// Minimum peak probability
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Interpret --threshold as a fraction of the most probable peak
    #[arg(long)]
    pub relative: bool,

    /// Total probability coverage target, in (0, 1]
    #[arg(long, conflicts_with = "threshold")]
    pub coverage: Option<f64>,

    /// Skip the exact trim of the coverage overshoot
    #[arg(long)]
    pub no_optimize: bool,

    /// Keep per-peak isotope configurations in the output
    #[arg(long)]
    pub keep_confs: bool,

    /// Use integer nucleon counts instead of exact isotope masses
    #[arg(long)]
    pub nominal: bool,

    /// Bin the envelope into buckets of this mass width
    #[arg(long)]
    pub bin_width: Option<f64>,

    /// Output JSON path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
