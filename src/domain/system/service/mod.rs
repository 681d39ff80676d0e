//! Operational endpoints: health probes, process status, sample data

pub mod health_service;
pub mod seed_service;
pub mod status_service;
