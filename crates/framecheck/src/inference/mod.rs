//! Constraint discovery.

mod discoverer;

pub use discoverer::Discoverer;
