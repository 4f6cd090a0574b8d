//! Feature selection passes.
//!
//! `stability` drops features whose distribution drifts across time cohorts;
//! `collinearity` removes features that are linearly predictable from the
//! rest of the candidate set. The two passes are independent and are usually
//! chained stability first.
pub mod collinearity;
pub mod stability;
