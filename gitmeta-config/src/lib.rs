//! A read-only reader for git's config file format: tokenizing `~/.gitconfig`-style files and
//! merging the five-tier hierarchy (`PROGRAMDATA`, system, XDG, global, local) a real
//! repository assembles its configuration from, including `include` and `includeIf` support.
#![deny(rust_2018_idioms)]

pub mod environment;
pub mod file;
pub mod key;
pub mod loader;
pub mod parse;
pub mod value;
pub mod values;

pub use environment::Environment;
pub use file::{File, Source, ValueEntry};
pub use key::VariableKey;
pub use loader::{load, Error};
