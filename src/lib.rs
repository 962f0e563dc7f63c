//! Homestead service: HTTP surface over the index sync façade and the
//! user-existence check, plus the bootstrap that wires them together.

pub mod bootstrap;
pub mod web;
