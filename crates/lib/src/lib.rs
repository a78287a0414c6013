//! buildgraph-lib: address resolution over declaration files and the
//! incremental rule engine that computes it.
//!
//! - `Address`: `namespace:name` identifier of one declared object
//! - `AddressMap` / `AddressFamily`: one file's objects, one directory's objects
//! - `Specs`: single, sibling and descendant queries over the address space
//! - `Scheduler`: memoized async rules with path-based invalidation
//! - `AddressMapper`: resolves specs against a project tree through the scheduler

pub mod address;
pub mod config;
pub mod consts;
pub mod engine;
pub mod fs;
pub mod graph;
pub mod mapper;
pub mod objects;
pub mod parser;
pub mod specs;
pub mod watch;
