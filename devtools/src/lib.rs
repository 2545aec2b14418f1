//! Developer tooling shared by Kiln projects
//!
//! Four pieces, all usable independently:
//! - [`checks`]: grouped safety checks that compile to nothing outside
//!   debug builds, toggled per group via cargo features
//! - [`dump`]: binary/hex rendering of values and byte slices
//! - [`testrun`]: self-registering unit tests with a console reporter
//! - [`patch`]: the text engines behind the `kiln` CLI (manifest feature
//!   toggling, guard rewriting)

pub mod checks;
pub mod dump;
pub mod patch;
pub mod testrun;
