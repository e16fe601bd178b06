//! Observation representations and observation spaces

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for observations from an environment
pub trait Observation: Clone + Debug + Send + Sync {
    /// Convert observation to a feature vector
    fn to_vec(&self) -> Vec<f64>;

    /// Get the shape of the observation
    fn shape(&self) -> Vec<usize>;
}

/// Trait for defining observation spaces
pub trait ObservationSpace: Send + Sync {
    /// The type of observations in this space
    type Observation: Observation;

    /// Sample an observation using the supplied generator
    fn sample_from(&self, rng: &mut dyn RngCore) -> Self::Observation;

    /// Sample a random observation from the space
    fn sample(&self) -> Self::Observation {
        self.sample_from(&mut rand::thread_rng())
    }

    /// Check if an observation is valid within this space
    fn contains(&self, obs: &Self::Observation) -> bool;

    /// Get the shape of observations in this space
    fn shape(&self) -> Vec<usize>;
}

/// Vector observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorObservation {
    /// The observation data
    pub data: Vec<f64>,
}

impl VectorObservation {
    /// Wrap a feature vector
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Number of components
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the observation has no components
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Observation for VectorObservation {
    fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.data.len()]
    }
}

impl std::ops::Index<usize> for VectorObservation {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

/// Box observation space
#[derive(Debug, Clone)]
pub struct BoxObservationSpace {
    /// Lower bounds
    pub low: Vec<f64>,
    /// Upper bounds
    pub high: Vec<f64>,
    /// Shape of observations
    pub shape: Vec<usize>,
}

impl BoxObservationSpace {
    /// Create a new box observation space
    pub fn new(low: Vec<f64>, high: Vec<f64>, shape: Vec<usize>) -> crate::Result<Self> {
        let total_size: usize = shape.iter().product();
        if low.len() != total_size {
            return Err(crate::RLError::DimensionMismatch {
                expected: total_size,
                actual: low.len(),
            });
        }
        if high.len() != total_size {
            return Err(crate::RLError::DimensionMismatch {
                expected: total_size,
                actual: high.len(),
            });
        }
        Ok(Self { low, high, shape })
    }

    /// Flat box of `dim` components sharing the same bounds
    pub fn uniform(dim: usize, low: f64, high: f64) -> crate::Result<Self> {
        Self::new(vec![low; dim], vec![high; dim], vec![dim])
    }
}

impl ObservationSpace for BoxObservationSpace {
    type Observation = VectorObservation;

    fn sample_from(&self, rng: &mut dyn RngCore) -> Self::Observation {
        let data: Vec<f64> = self
            .low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| {
                if l.is_finite() && h.is_finite() && l < h {
                    rng.gen_range(l..h)
                } else if l.is_finite() && h.is_finite() {
                    l
                } else {
                    // Unbounded component: draw near the origin and respect whichever side is bounded.
                    (rng.gen::<f64>() * 2.0 - 1.0).clamp(l, h)
                }
            })
            .collect();

        VectorObservation { data }
    }

    fn contains(&self, obs: &Self::Observation) -> bool {
        obs.data.len() == self.low.len()
            && obs
                .data
                .iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h)
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mismatched_bounds_are_rejected() {
        let err = BoxObservationSpace::new(vec![0.0; 3], vec![1.0; 2], vec![3]).unwrap_err();
        assert!(matches!(
            err,
            crate::RLError::DimensionMismatch { expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn float32_wide_box_contains_sentinels_but_not_nan() {
        let bound = f64::from(f32::MAX);
        let space = BoxObservationSpace::uniform(4, -bound, bound).unwrap();
        assert_eq!(space.shape(), vec![4]);
        assert!(space.contains(&VectorObservation::new(vec![0.5, 1.0, 1.0, -3.0])));
        assert!(!space.contains(&VectorObservation::new(vec![f64::NAN, 1.0, 1.0, 1.0])));
        assert!(!space.contains(&VectorObservation::new(vec![1.0; 3])));
    }

    #[test]
    fn samples_respect_bounds() {
        let space = BoxObservationSpace::new(
            vec![-1.0, 0.0, f64::NEG_INFINITY],
            vec![1.0, 0.0, f64::INFINITY],
            vec![3],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let obs = space.sample_from(&mut rng);
            assert!(space.contains(&obs));
        }
    }
}
