#![forbid(unsafe_code)]

mod blocks_tx;
mod edges_tx;
mod position_tx;
mod rows;
mod schema;
mod time;

pub(super) use blocks_tx::*;
pub(super) use edges_tx::*;
pub(super) use position_tx::*;
pub(super) use rows::*;
pub(super) use schema::migrate_sqlite_schema;
pub(super) use time::now_ms;
