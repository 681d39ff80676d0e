//! Domain logic grouped by data area

pub mod bandwidth;
pub mod dimensions;
pub mod storage;
pub mod streams;
pub mod system;
