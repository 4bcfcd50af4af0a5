pub mod aggregator;
pub mod cache;
pub mod fec;
pub mod portal;
pub mod roster;
