//! Command implementations.

pub mod cc;
pub mod mep;
pub mod monitor;
pub mod mrp;
