/// Neumaier-compensated accumulator.
///
/// Coverage targets are hit by summing up to millions of probabilities
/// spanning many orders of magnitude; naive summation loses enough mass to
/// move the stopping point. The compensation term keeps the running total
/// accurate to the last few ulps regardless of addition order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl std::iter::FromIterator<f64> for StableSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = StableSum::new();
        for x in iter {
            acc.add(x);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensates_small_terms() {
        // 1.0 followed by many terms that individually vanish against it.
        let mut acc = StableSum::new();
        acc.add(1.0);
        for _ in 0..1_000_000 {
            acc.add(1e-16);
        }
        let expected = 1.0 + 1e-10;
        assert!(
            (acc.total() - expected).abs() < 1e-13,
            "expected {}, got {}",
            expected,
            acc.total()
        );
    }

    #[test]
    fn test_matches_plain_sum_on_uniform_data() {
        let vals: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let acc: StableSum = vals.iter().copied().collect();
        assert_eq!(acc.total(), 5050.0);
    }
}
