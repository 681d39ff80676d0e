//! API route declarations (e.g., /api/v1/*)

pub mod bandwidth_routes;
pub mod data_routes;
pub mod system_routes;
