pub mod apply;
pub mod catalogs;
pub mod types;
