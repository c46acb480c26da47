pub mod catalog;
pub mod definitions;
pub mod node;

pub use catalog::{CatalogBuilder, CatalogError, MenuCatalog};
pub use node::{Digit, MenuLevel, MenuNode};
