use rand::rngs::StdRng;
use rand::Rng;

/// A duration-generating recipe attached to a Source's inter-arrival step or a
/// Process's delay step. Parsed once at build time, sampled many times at run
/// time against the process-wide seeded RNG (see `crate::scheduler`).
#[derive(Debug, Clone, PartialEq)]
pub enum DelaySpec {
    Constant { val: i64 },
    Uniform { min: i64, max: i64 },
    Triangular { min: i64, max: i64, mid: i64 },
    Exponential { rate: i64 },
    /// An unrecognized or absent `delayType`. Samples to zero, per the
    /// original system's behavior of leaving the duration at its initialized
    /// value when it doesn't recognize the distribution name.
    Unknown,
}

impl DelaySpec {
    /// Draws a non-negative duration in whole virtual seconds.
    pub fn sample(&self, rng: &mut StdRng) -> u64 {
        match *self {
            DelaySpec::Constant { val } => val.max(0) as u64,
            DelaySpec::Uniform { min, max } => {
                if max <= min {
                    min.max(0) as u64
                } else {
                    rng.gen_range(min..=max).max(0) as u64
                }
            }
            DelaySpec::Triangular { min, max, mid } => {
                Self::sample_triangular(min, max, mid, rng)
            }
            DelaySpec::Exponential { rate } => {
                if rate <= 0 {
                    0
                } else {
                    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                    let draw = -(1.0 / rate as f64) * u.ln();
                    draw.round().max(0.0) as u64
                }
            }
            DelaySpec::Unknown => 0,
        }
    }

    /// Inverse-transform sampling of the triangular distribution with mode
    /// `mid`, mirroring `random.triangular(min, max, mid)`.
    fn sample_triangular(min: i64, max: i64, mid: i64, rng: &mut StdRng) -> u64 {
        if max <= min {
            return min.max(0) as u64;
        }
        let (low, high, mode) = (min as f64, max as f64, mid as f64);
        let u: f64 = rng.gen_range(0.0..1.0);
        let split = (mode - low) / (high - low);
        let draw = if u < split {
            low + (u * (high - low) * (mode - low)).sqrt()
        } else {
            high - ((1.0 - u) * (high - low) * (high - mode)).sqrt()
        };
        draw.round().max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn constant_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let spec = DelaySpec::Constant { val: 10 };
        assert_eq!(spec.sample(&mut rng), 10);
        assert_eq!(spec.sample(&mut rng), 10);
    }

    #[test]
    fn unknown_samples_to_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DelaySpec::Unknown.sample(&mut rng), 0);
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let spec = DelaySpec::Uniform { min: 5, max: 10 };
        for _ in 0..200 {
            let d = spec.sample(&mut rng);
            assert!((5..=10).contains(&d));
        }
    }

    #[test]
    fn triangular_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = DelaySpec::Triangular { min: 0, max: 20, mid: 4 };
        for _ in 0..200 {
            let d = spec.sample(&mut rng);
            assert!(d <= 20);
        }
    }

    #[test]
    fn negative_constant_clamps_to_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DelaySpec::Constant { val: -5 }.sample(&mut rng), 0);
    }
}
