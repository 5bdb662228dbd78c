pub mod db;
pub mod error;
pub mod language;
pub mod schema;
pub mod term;
pub mod tokenize;

pub use db::*;
pub use error::*;
pub use language::*;
pub use term::*;
