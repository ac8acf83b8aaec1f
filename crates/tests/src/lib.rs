//! # Integration Tests
//!
//! End-to-end scenarios over synthetic datasets written to temporary folders:
//! catalog lookups, trial loading through every stream reader, calibration caching and
//! the revision guard.

#[cfg(test)]
mod support;

#[cfg(test)]
mod catalog_tests;

#[cfg(test)]
mod e2e_tests;

#[cfg(test)]
mod revision_tests;
