#[path = "../common/mod.rs"]
mod common;

mod attach;
mod cursors;
mod kv;
mod locks;
mod queries;
mod records;
mod services;
