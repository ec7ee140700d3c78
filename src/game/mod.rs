pub mod chart;
pub mod gameplay;
pub mod judgment;
pub mod profile;
pub mod rng;
pub mod upgrades;
