#![forbid(unsafe_code)]

//! Read paths. Nothing here mutates state; every soft-deleted row is invisible.

use super::*;

mod list;
mod read;
mod subtree;
