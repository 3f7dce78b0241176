//! Finite-state Markov chains with validated, self-rewriting transitions.
//!
//! A [`MarkovChain`] walks an ordered set of values using a row-stochastic
//! [`ProbabilityMatrix`]. Each decision draws one uniform number from a
//! caller-supplied [`rand::Rng`]. An optional transition callback may replace
//! the matrix after every decision, giving a non-stationary chain.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │   matrix      │────▶│    advance     │────▶│  transition fn   │
//!  │  (validate)   │     │ (inverse CDF)  │     │ (rewrite, check) │
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use drift_markov::MarkovChain;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let table = [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
//! let mut chain = MarkovChain::from_table(vec!["a", "b", "c"], &table).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let walked = chain.walk(5, &mut rng).unwrap();
//! assert_eq!(walked, ["b", "c", "a", "b", "c"]);
//! assert!(chain.has_next());
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod matrix;

pub(crate) mod sample;

pub use chain::{MarkovChain, Table, TransitionFn};
pub use config::{DEFAULT_TOLERANCE, MAX_TOLERANCE, MarkovConfig, RowPolicy};
pub use error::MarkovError;
pub use matrix::ProbabilityMatrix;
