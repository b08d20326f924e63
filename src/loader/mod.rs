pub mod container;
pub mod error;
pub mod images;
pub mod observatory;
