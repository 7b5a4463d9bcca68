use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use isoenv::{
    CoverageConfig,
    ThresholdConfig,
};

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum InputConfig {
    #[serde(rename = "formula")]
    Formula { formula: String },
    #[serde(rename = "fasta")]
    Fasta {
        sequence: String,
        #[serde(default = "default_true")]
        add_water: bool,
    },
    #[serde(rename = "formula_file")]
    FormulaFile { path: PathBuf },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub nominal_masses: bool,
    pub bin_width: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: ModeConfig::default(),
            nominal_masses: false,
            bin_width: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "mode")]
pub enum ModeConfig {
    #[serde(rename = "threshold")]
    Threshold(ThresholdConfig),
    #[serde(rename = "coverage")]
    Coverage(CoverageConfig),
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeConfig::Threshold(ThresholdConfig::default())
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Apply command line overrides on top of the (possibly default)
    /// config file contents.
    pub fn apply_cli_args(&mut self, args: &Cli) -> Result<(), CliError> {
        if let Some(formula) = &args.formula {
            self.input = Some(InputConfig::Formula {
                formula: formula.clone(),
            });
        }
        if let Some(sequence) = &args.fasta {
            self.input = Some(InputConfig::Fasta {
                sequence: sequence.clone(),
                add_water: true,
            });
        }
        if let Some(path) = &args.formula_file {
            self.input = Some(InputConfig::FormulaFile { path: path.clone() });
        }

        if args.threshold.is_some() && args.coverage.is_some() {
            return Err(CliError::Config {
                source: "--threshold and --coverage are mutually exclusive".to_string(),
            });
        }
        if let Some(threshold) = args.threshold {
            self.analysis.mode = ModeConfig::Threshold(ThresholdConfig {
                threshold,
                absolute: !args.relative,
                keep_confs: args.keep_confs,
                reorder_marginals: true,
            });
        }
        if let Some(target) = args.coverage {
            self.analysis.mode = ModeConfig::Coverage(CoverageConfig {
                target_total_prob: target,
                optimize: !args.no_optimize,
                keep_confs: args.keep_confs,
            });
        }
        if args.nominal {
            self.analysis.nominal_masses = true;
        }
        if let Some(width) = args.bin_width {
            self.analysis.bin_width = Some(width);
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }

        if self.input.is_none() {
            return Err(CliError::Config {
                source: "No input provided, please provide one in the config file or with \
                         --formula, --fasta or --formula-file"
                    .to_string(),
            });
        }
        Ok(())
    }
}
