//! Route groups mounted under `/matches`.

pub mod matches;
pub mod scoring;
pub mod system;
