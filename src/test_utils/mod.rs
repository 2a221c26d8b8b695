//! the test_utils folder here will share utils or test components between unit
//! tests of different modules
mod common;
mod mock;

pub use common::*;
pub use mock::*;
