//! Port traits at the seams of the domain.

pub mod config_port;
pub mod data_port;
pub mod indicator_port;
