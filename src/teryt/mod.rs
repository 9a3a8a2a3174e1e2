//! TERYT administrative table: loading and hierarchy reconstruction.

mod loader;
mod parser;

pub use loader::load_hierarchy;
pub use parser::parse_hierarchy;
