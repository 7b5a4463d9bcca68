use std::fs::File;
use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;

use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use serde::Serialize;
use tracing::{
    debug,
    info,
};

use isoenv::{
    FixedEnvelope,
    Iso,
};

use crate::config::{
    AnalysisConfig,
    ModeConfig,
};
use crate::errors::CliError;

const CHUNK_SIZE: usize = 256;

#[derive(Debug, Serialize)]
pub struct EnvelopeRecord {
    pub input: String,
    pub peak_count: usize,
    pub total_prob: f64,
    pub masses: Vec<f64>,
    pub probs: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confs: Option<Vec<u32>>,
}

impl EnvelopeRecord {
    fn new(input: &str, mut envelope: FixedEnvelope) -> Self {
        envelope.sort_by_mass();
        let total_prob = envelope.total_prob();
        let peak_count = envelope.len();
        let (masses, probs, confs) = envelope.into_parts();
        Self {
            input: input.to_string(),
            peak_count,
            total_prob,
            masses,
            probs,
            confs,
        }
    }
}

fn build_envelope(iso: Iso, analysis: &AnalysisConfig) -> Result<FixedEnvelope, CliError> {
    let mut envelope = match &analysis.mode {
        ModeConfig::Threshold(config) => FixedEnvelope::from_threshold(iso, config)?,
        ModeConfig::Coverage(config) => FixedEnvelope::from_coverage(iso, config)?,
    };
    if let Some(width) = analysis.bin_width {
        envelope = envelope.bin(width, 0.0);
    }
    Ok(envelope)
}

pub fn process_formula(formula: &str, analysis: &AnalysisConfig) -> Result<EnvelopeRecord, CliError> {
    let iso = if analysis.nominal_masses {
        Iso::from_formula_nominal(formula)?
    } else {
        Iso::from_formula(formula)?
    };
    let envelope = build_envelope(iso, analysis)?;
    Ok(EnvelopeRecord::new(formula, envelope))
}

pub fn process_fasta(
    sequence: &str,
    add_water: bool,
    analysis: &AnalysisConfig,
) -> Result<EnvelopeRecord, CliError> {
    let iso = Iso::from_fasta(sequence, add_water)?;
    let envelope = build_envelope(iso, analysis)?;
    Ok(EnvelopeRecord::new(sequence, envelope))
}

/// Batch mode: one formula per line, computed chunk-wise in parallel.
pub fn process_formula_file(
    path: &Path,
    analysis: &AnalysisConfig,
) -> Result<Vec<EnvelopeRecord>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    let formulas: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    info!("Computing envelopes for {} formulas", formulas.len());

    let start = Instant::now();
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap();

    let mut records = Vec::with_capacity(formulas.len());
    for chunk in formulas.chunks(CHUNK_SIZE).progress_with_style(style) {
        // Parallelism happens here within the batch call
        let envelopes = match &analysis.mode {
            ModeConfig::Threshold(config) => isoenv::batch::threshold_envelopes(chunk, config)?,
            ModeConfig::Coverage(config) => isoenv::batch::coverage_envelopes(chunk, config)?,
        };
        for (formula, mut envelope) in chunk.iter().zip(envelopes) {
            if let Some(width) = analysis.bin_width {
                envelope = envelope.bin(width, 0.0);
            }
            records.push(EnvelopeRecord::new(formula, envelope));
        }
    }
    debug!("Processed {} formulas in {:?}", records.len(), start.elapsed());
    Ok(records)
}

pub fn write_records(
    records: &[EnvelopeRecord],
    output: &Option<PathBuf>,
) -> Result<(), CliError> {
    let json = if records.len() == 1 {
        serde_json::to_string_pretty(&records[0])?
    } else {
        serde_json::to_string_pretty(records)?
    };
    match output {
        Some(path) => {
            let mut file = File::create(path).map_err(|e| CliError::Io {
                source: e.to_string(),
                path: Some(path.to_string_lossy().to_string()),
            })?;
            file.write_all(json.as_bytes()).map_err(|e| CliError::Io {
                source: e.to_string(),
                path: Some(path.to_string_lossy().to_string()),
            })?;
            info!("Wrote {} record(s) to {:?}", records.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
