use std::time::Duration;

// Arithmetic mean of every RTT sample seen so far, not Jacobson/Karels, and
// samples every ack regardless of whether the packet was retransmitted.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    samples: Vec<f64>,
    rto: Duration,
}

const INITIAL_RTO: Duration = Duration::from_millis(300);
const RTO_FLOOR: Duration = Duration::from_millis(100);
const RTO_MULTIPLIER: f64 = 5.0;
const SAMPLE_FLOOR_MS: f64 = 0.01;

impl Default for RttEstimator {
    fn default() -> Self {
        RttEstimator {
            samples: Vec::new(),
            rto: INITIAL_RTO,
        }
    }
}

impl RttEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rto(&self) -> Duration {
        self.rto
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn sample(&mut self, rtt_ms: f64) {
        let rtt_ms = rtt_ms.max(SAMPLE_FLOOR_MS);
        self.samples.push(rtt_ms);

        let srtt = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        let rto_ms = (srtt * RTO_MULTIPLIER).max(RTO_FLOOR.as_secs_f64() * 1000.0);
        self.rto = Duration::from_secs_f64(rto_ms / 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_300ms() {
        assert_eq!(RttEstimator::new().rto(), Duration::from_millis(300));
    }

    #[test]
    fn floors_at_100ms_for_tiny_samples() {
        let mut e = RttEstimator::new();
        e.sample(1.0);
        assert_eq!(e.rto(), RTO_FLOOR);
    }

    #[test]
    fn grows_with_sustained_high_rtt() {
        let mut e = RttEstimator::new();
        for _ in 0..5 {
            e.sample(200.0);
        }
        assert_eq!(e.rto(), Duration::from_millis(1000));
    }

    #[test]
    fn is_a_running_mean_not_ewma() {
        let mut e = RttEstimator::new();
        e.sample(100.0);
        e.sample(300.0);
        // mean = 200ms, rto = max(200*5, 100) = 1000ms
        assert_eq!(e.rto(), Duration::from_millis(1000));
        assert_eq!(e.sample_count(), 2);
    }

    #[test]
    fn clamps_sub_hundredth_ms_samples() {
        let mut e = RttEstimator::new();
        e.sample(0.0);
        // mean = 0.01ms, rto still floors at 100ms
        assert_eq!(e.rto(), RTO_FLOOR);
    }
}
