pub mod constants;
pub mod search;
pub mod station;
