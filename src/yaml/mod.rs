pub mod parser;
pub mod schema;

pub use parser::{load_fixture_file, parse_fixture};
pub use schema::{Fixture, YamlEntry};
