pub mod error;
pub mod export;
pub mod fields;
pub mod service;

pub use error::*;
pub use export::*;
pub use fields::*;
pub use service::*;
