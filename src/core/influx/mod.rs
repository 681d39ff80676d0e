//! InfluxDB 2.x access: Flux query construction, annotated-CSV decoding,
//! line-protocol encoding, and the HTTP client that ties them together.

pub mod client;
pub mod csv;
pub mod flux;
pub mod reader;
pub mod write;

pub use client::InfluxClient;
pub use csv::FluxRow;
pub use flux::{FluxQuery, TimeExpr};
pub use reader::FluxReader;
pub use write::Point;
