//! Parse, group, merge and re-emit `.env` files.
//!
//! Parsing keeps what a plain loader throws away: comments above rows,
//! commented-out assignments, and values superseded by a later duplicate
//! ("shadows"). Keys sharing a `PREFIX_` are grouped into [`Block`]s, and a
//! [`Document`] marshals back to canonical text.
//!
//! [`load`] and [`save`] read and write files; [`apply`] exports a document
//! into an in-memory map or, via the `unsafe` [`TargetEnv::process`], the
//! process environment.

mod assembly;
mod block;
mod config;
mod document;
mod env;
mod error;
pub mod grammar;
mod loader;
mod merge;
mod model;
mod parser;
mod row;
pub mod value;

pub use assembly::{RowSet, assemble};
pub use block::Block;
pub use config::{BannerTemplate, Config};
pub use document::{Document, Item};
pub use env::{TargetEnv, apply};
pub use error::{Error, ParseError, ParseErrorKind};
pub use loader::{
    EnvLoader, dotenv, from_filename, from_path, from_paths, load, save, save_with_config,
};
pub use model::{ApplyReport, Entry, LoadReport};
pub use parser::{
    parse_bytes, parse_bytes_with_config, parse_reader, parse_reader_with_config, parse_rows,
    parse_rows_with_config, parse_str, parse_str_with_config,
};
pub use row::{Row, normalize_key};
pub use value::normalize_value;
