//! Event and projection primitives shared by the scoring domain and its read models.

pub mod event;
pub mod projection;
pub mod runner;

pub use event::Event;
pub use projection::Projection;
pub use runner::{ProjectionCursor, ProjectionError, ProjectionRunner};
