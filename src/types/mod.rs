pub mod errors;
pub mod update;

pub use errors::*;
pub use update::*;
