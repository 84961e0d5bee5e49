pub mod erlang;
pub mod erlang_gen;
pub mod shared;

pub use erlang::{ErlangCodeGenerator, GeneratedUnit};
