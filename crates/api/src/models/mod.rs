pub mod moniker;
pub mod package;
pub mod symbol;

pub use moniker::*;
pub use package::*;
pub use symbol::*;
