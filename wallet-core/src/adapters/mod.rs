//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for durable accounts and ledger entries
//! - An in-memory store with the same unit semantics
//! - The row-lock table both of them serialize account units on

pub mod duckdb;
pub mod memory;
pub mod row_lock;
