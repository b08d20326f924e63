pub mod error;
pub mod filtering;
pub mod report;
pub mod rotate;
