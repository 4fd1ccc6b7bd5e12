//! HTTP middleware for the Farm Parcel Management Platform

pub mod auth;

pub use auth::{auth_middleware, AuthUser};
