//! Authors and posts for a small blog, with the field rules every write must pass.

pub mod application;
pub mod domain;
pub mod ports;
pub mod utils;
pub mod validation;
