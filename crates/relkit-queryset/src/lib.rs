//! # relkit-queryset
//!
//! Helpers over a selection of entities: create-or-update upserts, chunked
//! iteration and bulk mutation, random sampling, delete-impact inspection,
//! and field-name utilities.

pub mod chunking;
pub mod fields;
pub mod inspection;
pub mod queryset;
pub mod upsert;

pub use chunking::ChunkIter;
pub use fields::{field_exists, filter_field_dict, get_all_field_names};
pub use inspection::{related_object_counts, related_objects, DeleteInspection, Related};
pub use queryset::QuerySet;
pub use upsert::UpsertOptions;
