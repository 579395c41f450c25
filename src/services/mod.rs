pub mod entries;
pub mod mood;
pub mod stats;
