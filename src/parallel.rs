//! Conditional parallel iteration.
//!
//! Frequency-grid scans and batch processing go through these macros. With
//! the `parallel` feature (on by default) they expand to rayon parallel
//! iterators; without it they fall back to plain sequential iterators.
//! Both variants preserve input order on `collect`, so results are identical
//! either way.
//!
//! # Usage
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let power: Vec<f64> = iter_maybe_parallel!(0..grid.len())
//!     .map(|k| power_at(grid[k]))
//!     .collect();
//! ```

/// Conditionally parallel iteration over an owned collection or range.
///
/// Expands to `into_par_iter()` with the `parallel` feature and to
/// `into_iter()` without it.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}

/// Conditionally parallel reference iteration over a slice.
///
/// Expands to `par_iter()` with the `parallel` feature and to `iter()`
/// without it.
#[macro_export]
macro_rules! slice_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            $expr.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $expr.iter()
        }
    }};
}

pub use iter_maybe_parallel;
pub use slice_maybe_parallel;
