//! CLI command handling

pub mod close;
pub mod info;
pub mod listen;
pub mod send;

pub use close::*;
pub use info::*;
pub use listen::*;
pub use send::*;
