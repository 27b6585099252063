#![forbid(unsafe_code)]

use super::*;

mod attach;
mod delete;
mod purge;
mod relocate;
mod rows;
mod update;

