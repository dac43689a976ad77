//! Refinement problems built on the codec and the solver backends.

pub mod lf_refine;
