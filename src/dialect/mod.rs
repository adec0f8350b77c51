//! The dialect compiler: turns one or more XML dialect documents into the
//! immutable, shared [`Catalog`] the encoder and decoder read from.

pub mod catalog;
mod crc_extra;
mod xml;

pub use catalog::{Catalog, EnumGroup, FieldSpec, MessageSpec};
