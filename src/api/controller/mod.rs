//! HTTP controllers, one per route area

pub mod bandwidth;
pub mod data;
pub mod system;
