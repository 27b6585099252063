#![forbid(unsafe_code)]

mod blocks;
mod core;
mod indexes;
mod pragmas;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(pragmas::SQL);
    sql.push_str(core::SQL);
    sql.push_str(blocks::SQL);
    sql.push_str(indexes::SQL);
    sql
}
