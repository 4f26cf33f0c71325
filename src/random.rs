//! Named, independently seeded random number streams.
//!
//! Every random decision in the simulation draws from a stream keyed by a
//! marker type created with [`define_rng!`]. All streams derive their seed
//! from one base seed plus a hash of the stream's name, so adding draws to one
//! concern (say, movement) does not perturb another (say, mortality).

use std::any::{Any, TypeId};

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

use crate::hashing::{hash_str, HashMap};

/// Use this to define a unique type which will be used as a key to retrieve
/// an independent rng instance when calling `.get_rng`.
#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        #[derive(Copy, Clone, Debug)]
        pub struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $crate::rand::rngs::StdRng;

            fn get_name() -> &'static str {
                stringify!($random_id)
            }
        }
    };
}
pub use define_rng;

pub trait RngId: Any {
    type RngType: SeedableRng + RngCore + 'static;
    fn get_name() -> &'static str;
}

// This is a wrapper which allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// Stores a base seed and the lazily created streams derived from it.
pub struct RngStore {
    base_seed: u64,
    rng_holders: HashMap<TypeId, RngHolder>,
}

impl RngStore {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RngStore {
            base_seed,
            rng_holders: HashMap::default(),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Gets a mutable reference to the random number generator associated with the given
    /// `RngId`. If the Rng has not been used before, one will be created from the base seed.
    pub fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .unwrap_or_else(|| {
                panic!(
                    "internal error: rng stored for {} has the wrong type",
                    R::get_name()
                )
            })
    }

    /// The uniform sampler `U()`: a draw from `[0, 1)`.
    pub fn sample_uniform<R: RngId>(&mut self) -> f64 {
        self.get_rng::<R>().random::<f64>()
    }

    /// Borrows the stream as a `U()` closure, for code that takes its
    /// randomness as a plain function.
    pub fn uniform_source<R: RngId>(&mut self) -> impl FnMut() -> f64 + '_ {
        let rng = self.get_rng::<R>();
        move || rng.random::<f64>()
    }

    pub fn sample_range<R, S, T>(&mut self, range: S) -> T
    where
        R: RngId,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.get_rng::<R>().random_range(range)
    }

    /// A uniformly random ordering of `0..len`.
    pub fn sample_permutation<R: RngId>(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(self.get_rng::<R>());
        order
    }

    /// Up to `amount` distinct indexes from `0..len`, in random order. Asking
    /// for more than `len` yields all of them.
    pub fn sample_without_replacement<R: RngId>(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(self.get_rng::<R>(), len, amount.min(len)).into_vec()
    }
}
