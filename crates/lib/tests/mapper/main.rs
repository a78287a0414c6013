//! Address mapper integration tests over on-disk project trees.

mod common;
mod invalidation_tests;
mod resolve_tests;
