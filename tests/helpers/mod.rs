#![allow(dead_code, unused_imports)]
pub mod harness;
pub mod mocks;
pub mod test_db;

pub use harness::*;
pub use mocks::*;
pub use test_db::*;
