//! # dapclient: OPeNDAP/DODS client
//!
//! Parsers for the two DAP2 text grammars and a decoder for the binary data
//! response:
//!
//! - **DDS** (Dataset Descriptor Structure): variable names, types and shapes,
//!   parsed into a [`DapVar`] tree by [`parse_dds`].
//! - **DAS** (Dataset Attribute Structure): metadata grafted onto that tree by
//!   [`parse_das`], including aliases and Grid map promotion.
//! - **DODS/XDR**: big-endian, 4-byte aligned payload decoded by [`unpack`] into
//!   nested [`Value`] lists shaped like the tree.
//!
//! ## Variable kinds
//!
//! - `Dataset`, `Structure`, `Sequence`: containers of named children
//! - `Grid`: one dependent array plus coordinate maps
//! - Base: `Byte`, `Int`, `UInt`, `Int16`, `UInt16`, `Int32`, `UInt32`,
//!   `Float32`, `Float64`, `String`, `Url`, `Alias`, optionally with dimensions
//!
//! ## Example DDS
//!
//! ```text
//! Dataset {
//!     Grid {
//!       Array:
//!         Float32 sst[time = 2][lat = 3];
//!       Maps:
//!         Float64 time[time = 2];
//!         Float64 lat[lat = 3];
//!     } sst;
//! } oisst;
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use dapclient::{Client, ClientConfig, FileFetcher};
//!
//! let client = Client::new(FileFetcher, ClientConfig::default());
//! let dataset = client.load_dataset("data/oisst")?;
//! let data = client.load_data("data/oisst.dods")?;
//! println!("{} variables, {:?}", dataset.components().len(), data.value);
//! # Ok::<(), dapclient::Error>(())
//! ```

pub mod ast;
pub mod client;
pub mod codec;
pub mod cursor;
pub mod das;
pub mod dump;
pub mod error;
pub mod frame;
pub mod parser;
pub mod value;

pub use ast::{AttrValue, Attributes, BaseVar, Children, DapVar, DataType, Grid, VarKind};
#[cfg(feature = "http")]
pub use client::HttpFetcher;
pub use client::{request_url, Client, ClientConfig, Fetch, FileFetcher};
pub use codec::{reshape, unpack, Unpacker, END_OF_SEQUENCE, START_OF_SEQUENCE};
pub use das::parse_das;
pub use error::{Error, Result};
pub use frame::{decode_data_response, split_data_response, DataResponse, DecodedData, DATA_MARKER};
pub use parser::parse_dds;
pub use value::Value;
