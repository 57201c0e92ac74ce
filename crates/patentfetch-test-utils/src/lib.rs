//! patentfetch-test-utils: Fixtures shared by the workspace test suites.

pub mod fixtures;
