//! Route handlers.

pub mod exemptions;
pub mod time;
