//! Search space definition and candidate-proposal strategies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use vt_types::{
    CandidateSpec, ErrorDist, MeanModel, OrderBounds, SearchError, VolModel, VtResult,
};

/// How the volatility-model dimension is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolChoice {
    /// Free categorical choice over the whole family.
    Free,
    /// Restricted to the given subset.
    OneOf(Vec<VolModel>),
    /// Pinned to a single family. The dimension is removed from the
    /// search: every candidate, including the final best, carries this
    /// value by construction.
    Fixed(VolModel),
}

impl VolChoice {
    pub fn choices(&self) -> Vec<VolModel> {
        match self {
            VolChoice::Free => VolModel::ALL.to_vec(),
            VolChoice::OneOf(list) => list.clone(),
            VolChoice::Fixed(v) => vec![*v],
        }
    }

    pub fn fixed(&self) -> Option<VolModel> {
        match self {
            VolChoice::Fixed(v) => Some(*v),
            _ => None,
        }
    }
}

/// The legal range of every candidate dimension.
///
/// Construction validates the bounds, so an impossible space fails fast
/// before any trial runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarchSearchSpace {
    bounds: OrderBounds,
    vol: VolChoice,
}

impl GarchSearchSpace {
    pub fn new(bounds: OrderBounds, vol: VolChoice) -> VtResult<Self> {
        bounds.validate()?;
        if matches!(&vol, VolChoice::OneOf(list) if list.is_empty()) {
            return Err(SearchError::EmptyVolRestriction.into());
        }
        Ok(Self { bounds, vol })
    }

    pub fn bounds(&self) -> &OrderBounds {
        &self.bounds
    }

    pub fn vol(&self) -> &VolChoice {
        &self.vol
    }

    /// Draw one candidate uniformly from the space.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CandidateSpec {
        let vols = self.vol.choices();
        CandidateSpec {
            p: rng.random_range(1..=self.bounds.max_p),
            q: rng.random_range(1..=self.bounds.max_q),
            o: rng.random_range(0..=self.bounds.max_o),
            lags: rng.random_range(0..=self.bounds.max_lag),
            mean: MeanModel::ALL[rng.random_range(0..MeanModel::ALL.len())],
            vol: vols[rng.random_range(0..vols.len())],
            dist: ErrorDist::ALL[rng.random_range(0..ErrorDist::ALL.len())],
        }
    }

    /// Total number of distinct candidates.
    pub fn grid_size(&self) -> usize {
        self.bounds.max_p
            * self.bounds.max_q
            * (self.bounds.max_o + 1)
            * (self.bounds.max_lag + 1)
            * MeanModel::ALL.len()
            * self.vol.choices().len()
            * ErrorDist::ALL.len()
    }

    /// Enumerate every candidate in a fixed deterministic order.
    pub fn all_candidates(&self) -> Vec<CandidateSpec> {
        let mut combos = Vec::with_capacity(self.grid_size());
        for p in 1..=self.bounds.max_p {
            for q in 1..=self.bounds.max_q {
                for o in 0..=self.bounds.max_o {
                    for lags in 0..=self.bounds.max_lag {
                        for mean in MeanModel::ALL {
                            for vol in self.vol.choices() {
                                for dist in ErrorDist::ALL {
                                    combos.push(CandidateSpec {
                                        p,
                                        q,
                                        o,
                                        lags,
                                        mean,
                                        vol,
                                        dist,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        combos
    }
}

// ---------------------------------------------------------------------------
// Search strategies
// ---------------------------------------------------------------------------

/// Common trait for all candidate-proposal strategies.
pub trait SearchStrategy: Send {
    /// Generate the next batch of candidates to evaluate.
    fn suggest(&mut self, count: usize) -> Vec<CandidateSpec>;

    /// Report completed trial objectives so adaptive strategies can learn.
    fn report(&mut self, _candidate: &CandidateSpec, _objective: f64) {}

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

// ---- Random search ----

/// Independent uniform sampling across the search space.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: GarchSearchSpace,
    rng: StdRng,
}

impl RandomSearch {
    pub fn new(space: GarchSearchSpace, seed: u64) -> Self {
        Self {
            space,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<CandidateSpec> {
        (0..count).map(|_| self.space.sample(&mut self.rng)).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- Grid search ----

/// Exhaustive enumeration in a fixed order. Returns fewer candidates than
/// asked once the grid is exhausted, which ends the run early.
#[derive(Debug, Clone)]
pub struct GridSearch {
    cursor: usize,
    combos: Vec<CandidateSpec>,
}

impl GridSearch {
    pub fn new(space: GarchSearchSpace) -> Self {
        Self {
            cursor: 0,
            combos: space.all_candidates(),
        }
    }
}

impl SearchStrategy for GridSearch {
    fn suggest(&mut self, count: usize) -> Vec<CandidateSpec> {
        let end = (self.cursor + count).min(self.combos.len());
        let batch = self.combos[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    fn name(&self) -> &str {
        "grid"
    }
}

// ---- Adaptive search ----

/// Explore/exploit sampler.
///
/// Tracks observed (candidate, objective) pairs and biases sampling
/// toward the neighborhood of the best candidate seen so far: integer
/// orders are perturbed within their bounds, categorical dimensions are
/// resampled. Rejected candidates (infinite objective) never become an
/// exploitation anchor.
#[derive(Debug, Clone)]
pub struct AdaptiveSearch {
    space: GarchSearchSpace,
    observations: Vec<(CandidateSpec, f64)>,
    exploration_weight: f64,
    rng: StdRng,
}

impl AdaptiveSearch {
    pub fn new(space: GarchSearchSpace, exploration_weight: f64, seed: u64) -> Self {
        Self {
            space,
            observations: Vec::new(),
            exploration_weight,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn explore(&mut self) -> CandidateSpec {
        self.space.sample(&mut self.rng)
    }

    /// Exploitation: perturb the best-known candidate.
    fn exploit(&mut self) -> CandidateSpec {
        let best = self
            .observations
            .iter()
            .filter(|(_, objective)| objective.is_finite())
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| *candidate);

        let base = match best {
            Some(candidate) => candidate,
            None => return self.explore(),
        };

        let bounds = *self.space.bounds();
        let vols = self.space.vol().choices();
        CandidateSpec {
            p: perturb(&mut self.rng, base.p, 1, bounds.max_p),
            q: perturb(&mut self.rng, base.q, 1, bounds.max_q),
            o: perturb(&mut self.rng, base.o, 0, bounds.max_o),
            lags: perturb(&mut self.rng, base.lags, 0, bounds.max_lag),
            mean: MeanModel::ALL[self.rng.random_range(0..MeanModel::ALL.len())],
            vol: vols[self.rng.random_range(0..vols.len())],
            dist: ErrorDist::ALL[self.rng.random_range(0..ErrorDist::ALL.len())],
        }
    }
}

fn perturb<R: Rng + ?Sized>(rng: &mut R, value: usize, lo: usize, hi: usize) -> usize {
    let delta: i64 = rng.random_range(-2..=2);
    (value as i64 + delta).clamp(lo as i64, hi as i64) as usize
}

impl SearchStrategy for AdaptiveSearch {
    fn suggest(&mut self, count: usize) -> Vec<CandidateSpec> {
        (0..count)
            .map(|_| {
                if self.observations.is_empty()
                    || self.rng.random::<f64>() < self.exploration_weight
                {
                    self.explore()
                } else {
                    self.exploit()
                }
            })
            .collect()
    }

    fn report(&mut self, candidate: &CandidateSpec, objective: f64) {
        self.observations.push((*candidate, objective));
    }

    fn name(&self) -> &str {
        "adaptive"
    }
}
