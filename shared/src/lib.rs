//! Shared types and geometry kernel for the Farm Parcel Management Platform
//!
//! This crate contains the pure, I/O-free parts of the system: the polygon
//! geometry kernel and the types shared between the backend and any other
//! component.

pub mod geometry;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;
