pub mod games;
pub mod groups;
pub mod outcome;
pub mod recalculation;
pub mod server;
pub mod statistics;

#[cfg(test)]
pub(crate) mod fixtures;
