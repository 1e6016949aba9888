//! Query functions. Each takes an already-locked `&Connection` plus the
//! schema, so they compose without re-entering the connection lock.

pub mod codec;
pub mod entity_crud;
pub mod filter;
pub mod fulltext;
pub mod history_ops;
pub mod relation_ops;
