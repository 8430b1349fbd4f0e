//! Crate-internal end-to-end tests: byte stream in, grid state out.

mod properties;
