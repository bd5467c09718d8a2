//! Carina Core
//!
//! Resource, state, and provider abstractions shared by Carina providers.
//! The engine hands a provider desired-state `Resource`s and persists the
//! observed `State`s it returns.

pub mod provider;
pub mod resource;
pub mod schema;
