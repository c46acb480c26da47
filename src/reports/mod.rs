pub mod commands;

pub use commands::PageQuery;
