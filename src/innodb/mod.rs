//! InnoDB binary format parsing.
//!
//! Leaf-first: [`space`] hands out [`page::Page`]s, [`record`] and
//! [`field_decode`] decode what is on them, [`index`] and [`cursor`] work on
//! one B+Tree node, [`btree`] walks a whole tree, and [`dictionary`] uses all
//! of it to read InnoDB's own catalog.

pub mod btree;
pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod dictionary;
pub mod field_decode;
pub mod index;
pub mod page;
pub mod page_types;
pub mod record;
pub mod schema;
pub mod space;
