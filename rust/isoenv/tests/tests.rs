use isoenv::{
    CoverageConfig,
    FixedEnvelope,
    Iso,
    OrderedGenerator,
    PeakGenerator,
    StochasticGenerator,
    ThresholdConfig,
    ThresholdGenerator,
};

fn full_envelope(formula: &str) -> FixedEnvelope {
    let iso = Iso::from_formula(formula).unwrap();
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
fn test_full_enumeration_partitions_probability_space() {
    for formula in ["H2O1", "C2H6O1", "C6H12O6", "C22H30N6O4S1"] {
        let mut envelope = full_envelope(formula);
        assert!(
            (envelope.total_prob() - 1.0).abs() < 1e-9,
            "{} sums to {}",
            formula,
            envelope.total_prob()
        );
    }
}

#[test]
fn test_monotonic_threshold_containment() {
    let make = |threshold: f64| {
        let iso = Iso::from_formula("C12H20N4O6").unwrap();
        let mut envelope = FixedEnvelope::from_threshold(
            iso,
            &ThresholdConfig {
                threshold,
                absolute: true,
                keep_confs: false,
                reorder_marginals: true,
            },
        )
        .unwrap();
        envelope.sort_by_mass();
        envelope
    };
    let strict = make(1e-3);
    let loose = make(1e-6);
    assert!(strict.len() < loose.len());

    // every peak of the strict set appears in the loose set
    for (&mass, &prob) in strict.masses().iter().zip(strict.probs()) {
        let found = loose
            .masses()
            .iter()
            .zip(loose.probs())
            .any(|(&m, &p)| (m - mass).abs() < 1e-9 && (p - prob).abs() < 1e-12);
        assert!(found, "peak at {} missing from looser enumeration", mass);
    }
}

#[test]
fn test_mode_membership() {
    let iso = Iso::from_formula("C100H160N40O30S2").unwrap();
    let mode_lprob = iso.mode_lprob();

    let mut threshold = ThresholdGenerator::new(iso.clone(), 1e-9, true, true);
    assert!(threshold.advance());
    assert!((threshold.lprob() - mode_lprob).abs() < 1e-9);

    let mut ordered = OrderedGenerator::new(iso);
    assert!(ordered.advance());
    assert!((ordered.lprob() - mode_lprob).abs() < 1e-9);
}

#[test]
fn test_ordered_generator_order_property() {
    let iso = Iso::from_formula("C25H44O10").unwrap();
    let mut generator = OrderedGenerator::new(iso);
    let mut previous = f64::INFINITY;
    for _ in 0..20_000 {
        if !generator.advance() {
            break;
        }
        assert!(generator.prob() <= previous + 1e-15);
        previous = generator.prob();
    }
}

#[test]
fn test_coverage_matches_sorted_prefix() {
    for target in [0.5, 0.9, 0.99, 0.999] {
        let iso = Iso::from_formula("C10H16N4O4S1").unwrap();
        let mut covered = FixedEnvelope::from_coverage(
            iso.clone(),
            &CoverageConfig {
                target_total_prob: target,
                optimize: true,
                keep_confs: false,
            },
        )
        .unwrap();

        let mut full = FixedEnvelope::from_threshold(
            iso,
            &ThresholdConfig {
                threshold: 0.0,
                absolute: true,
                keep_confs: false,
                reorder_marginals: true,
            },
        )
        .unwrap();
        full.sort_by_prob();
        let mut acc = 0.0;
        let mut minimal = 0usize;
        for &p in full.probs() {
            acc += p;
            minimal += 1;
            if acc >= target {
                break;
            }
        }

        assert_eq!(
            covered.len(),
            minimal,
            "coverage {} returned {} peaks, minimal is {}",
            target,
            covered.len(),
            minimal
        );
        assert!(covered.total_prob() >= target);
    }
}

#[test]
fn test_single_element_mass_round_trip() {
    // 2-isotope element, n atoms: extremes are n*m0 and n*m1
    let n = 17;
    let iso = Iso::from_parts(
        &[n],
        &[vec![10.0, 11.0]],
        &[vec![0.7, 0.3]],
    )
    .unwrap();
    assert_eq!(iso.lightest_peak_mass(), n as f64 * 10.0);
    assert_eq!(iso.heaviest_peak_mass(), n as f64 * 11.0);

    let mut envelope = FixedEnvelope::from_threshold(
        iso,
        &ThresholdConfig {
            threshold: 0.0,
            absolute: true,
            keep_confs: false,
            reorder_marginals: true,
        },
    )
    .unwrap();
    assert_eq!(envelope.len(), n as usize + 1);
    assert_eq!(envelope.lightest_peak_mass(), Some(n as f64 * 10.0));
    assert_eq!(envelope.heaviest_peak_mass(), Some(n as f64 * 11.0));
    assert!((envelope.total_prob() - 1.0).abs() < 1e-9);
}

#[test]
fn test_ethanol_scenario() {
    let iso = Iso::from_formula("C2H6O1").unwrap();
    let monoisotopic = iso.monoisotopic_peak_mass();

    let mut envelope = FixedEnvelope::from_threshold(
        iso,
        &ThresholdConfig {
            threshold: 0.001,
            absolute: true,
            keep_confs: false,
            reorder_marginals: true,
        },
    )
    .unwrap();
    envelope.sort_by_prob();

    // the monoisotopic peak is the single most probable one
    assert!((envelope.masses()[0] - monoisotopic).abs() < 1e-9);
    assert!(envelope.probs()[0] > envelope.probs()[1]);

    // most, but not all, of the probability mass is captured
    let captured = envelope.total_prob();
    assert!(captured < 1.0);
    assert!(captured > 0.95, "captured only {}", captured);

    let mut everything = full_envelope("C2H6O1");
    assert!((everything.total_prob() - 1.0).abs() < 1e-9);
}

#[test]
fn test_binning_idempotence() {
    let mut envelope = full_envelope("C22H30N6O4S1");
    let mut binned = envelope.bin(1.00235, 0.0);
    let rebinned = binned.bin(1.00235, 0.0);
    assert_eq!(binned.masses(), rebinned.masses());
    assert_eq!(binned.probs(), rebinned.probs());
}

#[test]
fn test_wasserstein_self_distance() {
    let mut a = full_envelope("C6H12O6");
    let mut b = full_envelope("C6H12O6");
    assert_eq!(a.wasserstein_distance(&mut b).unwrap(), 0.0);

    // two different molecules are a positive distance apart
    let mut c = full_envelope("C6H12O6");
    let mut d = full_envelope("C6H14O6");
    let distance = c.wasserstein_distance(&mut d).unwrap();
    assert!(distance > 0.0);
}

#[test]
fn test_stochastic_count_conservation() {
    let iso = Iso::from_formula("C6H12O6").unwrap();
    let n = 50_000;
    let mut generator = StochasticGenerator::with_seed(iso, n, 1234);
    let mut total = 0u64;
    while generator.advance() {
        total += generator.count();
    }
    assert_eq!(total, n);
}

#[test]
fn test_generator_and_envelope_agree() {
    let iso = Iso::from_formula("C10H12N5O3").unwrap();
    let mut generator = ThresholdGenerator::new(iso.clone(), 1e-6, true, true);
    let mut drained = Vec::new();
    while generator.advance() {
        drained.push((generator.mass(), generator.prob()));
    }

    let envelope = FixedEnvelope::from_threshold(
        iso,
        &ThresholdConfig {
            threshold: 1e-6,
            absolute: true,
            keep_confs: false,
            reorder_marginals: true,
        },
    )
    .unwrap();
    assert_eq!(envelope.len(), drained.len());
    for (i, &(mass, prob)) in drained.iter().enumerate() {
        assert_eq!(envelope.masses()[i], mass);
        assert_eq!(envelope.probs()[i], prob);
    }
}

#[test]
fn test_formula_error_paths() {
    assert!(Iso::from_formula("").is_err());
    assert!(Iso::from_formula("C2H").is_err());
    assert!(Iso::from_formula("Qq3").is_err());
    assert!(Iso::from_formula("C2 H6").is_err());
}
