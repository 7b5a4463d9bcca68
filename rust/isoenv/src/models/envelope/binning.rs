use crate::models::envelope::FixedEnvelope;
use crate::utils::StableSum;

impl FixedEnvelope {
    /// Collapse the envelope into fixed-width mass buckets.
    ///
    /// Peak probabilities are summed into the bucket whose center
    /// `middle + k * width` is nearest to their mass; the result carries
    /// one peak per occupied bucket, at the bucket center, sorted by
    /// mass. Binning an already-binned envelope with the same `width` and
    /// `middle` is a no-op. Configurations do not survive binning.
    pub fn bin(&mut self, width: f64, middle: f64) -> FixedEnvelope {
        assert!(width > 0.0, "bin width must be positive");
        self.sort_by_mass();

        let mut masses: Vec<f64> = Vec::new();
        let mut probs: Vec<f64> = Vec::new();
        let mut current_bucket: Option<i64> = None;
        let mut acc = StableSum::new();

        for (&mass, &prob) in self.masses().iter().zip(self.probs().iter()) {
            let bucket = ((mass - middle) / width).round() as i64;
            match current_bucket {
                Some(open) if open == bucket => acc.add(prob),
                Some(open) => {
                    masses.push(open as f64 * width + middle);
                    probs.push(acc.total());
                    current_bucket = Some(bucket);
                    acc = StableSum::new();
                    acc.add(prob);
                }
                None => {
                    current_bucket = Some(bucket);
                    acc.add(prob);
                }
            }
        }
        if let Some(open) = current_bucket {
            masses.push(open as f64 * width + middle);
            probs.push(acc.total());
        }

        let mut binned = FixedEnvelope {
            masses,
            probs,
            ..FixedEnvelope::default()
        };
        binned.sorted_by_mass = true;
        binned
    }
}

#[cfg(test)]
mod tests {
    use crate::models::envelope::{
        FixedEnvelope,
        ThresholdConfig,
    };
    use crate::models::iso::Iso;

    fn ethanol_envelope() -> FixedEnvelope {
        let iso = Iso::from_formula("C2H6O1").unwrap();
        FixedEnvelope::from_threshold(
            iso,
            &ThresholdConfig {
                threshold: 0.0,
                absolute: true,
                keep_confs: false,
                reorder_marginals: true,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_bin_conserves_probability() {
        let mut envelope = ethanol_envelope();
        let before = envelope.total_prob();
        let mut binned = envelope.bin(1.0, 0.0);
        assert!(binned.len() < envelope.len());
        assert!((binned.total_prob() - before).abs() < 1e-12);
    }

    #[test]
    fn test_bin_idempotent() {
        let mut envelope = ethanol_envelope();
        let mut binned = envelope.bin(0.5, 0.1);
        let rebinned = binned.bin(0.5, 0.1);
        assert_eq!(binned.masses(), rebinned.masses());
        assert_eq!(binned.probs(), rebinned.probs());
    }

    #[test]
    fn test_bucket_centers() {
        let mut envelope = ethanol_envelope();
        let binned = envelope.bin(1.0, 0.25);
        for &m in binned.masses() {
            let offset = (m - 0.25) / 1.0;
            assert!((offset - offset.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bin_empty() {
        let mut envelope = FixedEnvelope::empty();
        let binned = envelope.bin(1.0, 0.0);
        assert!(binned.is_empty());
    }
}
