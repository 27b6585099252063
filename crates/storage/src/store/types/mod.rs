#![forbid(unsafe_code)]

mod batch;
mod blocks;
mod workspaces;

pub use batch::*;
pub use blocks::*;
pub use workspaces::*;
