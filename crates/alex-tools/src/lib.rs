pub mod brokerage;
pub mod catalog;
pub mod definitions;
pub mod file_ops;
pub mod trading;

pub use catalog::AlexToolCatalog;
