pub mod actor;
pub mod context;
pub mod contract;
pub mod evaluation;
pub mod rule;
