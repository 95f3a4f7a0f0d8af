use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// -----------------------------
// Simulation generator
// -----------------------------

/// Tenths of a degree: samples are uniform over [80.0, 120.0) in 0.1 steps.
const SIM_TEMP_TENTHS: std::ops::Range<u32> = 800..1200;
/// Trip threshold of the synthetic generator. Above the sampling range, so the
/// simulated trip never fires.
pub const SIM_TRIP_ABOVE: f64 = 135.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSample {
    pub temp_l1: f64,
    pub temp_l3: f64,
    pub trip: bool,
}

pub fn sample<R: Rng>(rng: &mut R) -> SimSample {
    let temp_l1 = f64::from(rng.gen_range(SIM_TEMP_TENTHS)) / 10.0;
    let temp_l3 = f64::from(rng.gen_range(SIM_TEMP_TENTHS)) / 10.0;
    SimSample {
        temp_l1,
        temp_l3,
        trip: temp_l1 > SIM_TRIP_ABOVE,
    }
}

pub struct Simulator<R = StdRng> {
    rng: R,
    period: Duration,
    next_tick: Option<Instant>,
}

impl Simulator<StdRng> {
    pub fn new(period: Duration) -> Self {
        Self::with_rng(period, StdRng::from_entropy())
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(period: Duration, rng: R) -> Self {
        Self {
            rng,
            period,
            next_tick: None,
        }
    }

    pub fn running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// First sample is due one period after `now`.
    pub fn start(&mut self, now: Instant) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + self.period);
        }
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Returns at most one sample per call. Missed periods are not replayed.
    pub fn poll(&mut self, now: Instant) -> Option<SimSample> {
        let due = self.next_tick?;
        if now < due {
            return None;
        }
        let mut next = due + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_tick = Some(next);
        Some(sample(&mut self.rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Simulator<StdRng> {
        Simulator::with_rng(Duration::from_secs(1), StdRng::seed_from_u64(7))
    }

    #[test]
    fn samples_stay_in_range_and_never_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let s = sample(&mut rng);
            for t in [s.temp_l1, s.temp_l3] {
                assert!((80.0..120.0).contains(&t), "{t} out of range");
                assert_eq!(t, (t * 10.0).round() / 10.0, "{t} not one decimal");
            }
            assert!(!s.trip);
        }
    }

    #[test]
    fn ticks_once_per_period() {
        let mut sim = seeded();
        let t0 = Instant::now();
        assert!(sim.poll(t0).is_none(), "idle simulator must not tick");

        sim.start(t0);
        assert!(sim.poll(t0).is_none());
        assert!(sim.poll(t0 + Duration::from_millis(999)).is_none());
        assert!(sim.poll(t0 + Duration::from_secs(1)).is_some());
        assert!(sim.poll(t0 + Duration::from_millis(1500)).is_none());
        assert!(sim.poll(t0 + Duration::from_secs(2)).is_some());
    }

    #[test]
    fn stall_does_not_burst() {
        let mut sim = seeded();
        let t0 = Instant::now();
        sim.start(t0);
        let late = t0 + Duration::from_secs(10);
        assert!(sim.poll(late).is_some());
        assert!(sim.poll(late).is_none());
        assert!(sim.poll(late + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn stop_cancels_ticks() {
        let mut sim = seeded();
        let t0 = Instant::now();
        sim.start(t0);
        sim.stop();
        assert!(!sim.running());
        assert!(sim.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn restart_does_not_reset_pending_tick() {
        let mut sim = seeded();
        let t0 = Instant::now();
        sim.start(t0);
        sim.start(t0 + Duration::from_millis(900));
        assert!(sim.poll(t0 + Duration::from_secs(1)).is_some());
    }
}
