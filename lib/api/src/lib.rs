//! HTTP surface for argrisk
//!
//! JSON endpoints for single lookup, bulk lookup and the risk index, with
//! `?format=csv` downloads of the result tables.

pub mod rest;

pub use rest::{ApiState, RestApi};
