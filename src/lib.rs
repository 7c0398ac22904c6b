//! Persistent project memory for AI coding agents, served over MCP.
//!
//! tabula keeps a small per-project store of the facts an agent needs across
//! otherwise stateless sessions:
//!
//! | Table | Shape | Lifecycle |
//! |-------|-------|-----------|
//! | **Decisions** | append-only log | oldest evicted at capacity |
//! | **Patterns** | keyed by name | replaced in place, rejected at capacity |
//! | **Context** | key/value | overwritten in place, rejected at capacity |
//!
//! # Architecture
//!
//! - **Storage**: SQLite in WAL mode — concurrent readers, serialized writers
//! - **Concurrency**: a fixed-size r2d2 connection pool with a bounded
//!   acquire timeout as the sole backpressure mechanism
//! - **Protection**: sliding-window rate limiting, strict input validation,
//!   and per-table capacity enforcement before every commit
//! - **Transport**: MCP over stdio, plus an equivalent CLI
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite initialization, schema, migrations, and the connection pool
//! - [`error`] — The service error taxonomy
//! - [`limiter`] — Sliding-window rate limiting with optional persistence
//! - [`memory`] — Core store: decisions, patterns, context, stats, export, health
//! - [`protocol`] — The closed operation set and structured responses
//! - [`service`] — Process-wide context tying pool, limiter, and config together

pub mod config;
pub mod db;
pub mod error;
pub mod limiter;
pub mod memory;
pub mod protocol;
pub mod server;
pub mod service;
pub mod tools;
