//! Domain model: attribute store, record contract and site entities.
//!
//! # Responsibility
//! - Define the typed column sets of every table.
//! - Normalize raw rows into stable, typed attribute stores.
//! - Layer read-only derived behavior onto records via extension traits.
//!
//! # Invariants
//! - Column names only exist as per-entity enums; raw strings are resolved
//!   once at the storage boundary.
//! - Records never mutate themselves; writes go through column-tagged
//!   payloads on a query.

/// Declares a column enum and its `Column` implementation.
macro_rules! record_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $table:literal {
            $($(#[$variant_meta:meta])* $variant:ident => $column:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $crate::model::attributes::Column for $name {
            const TABLE: &'static str = $table;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $column),+
                }
            }
        }
    };
}

pub mod attributes;
pub mod conference;
pub mod event;
pub mod human_time;
pub mod location;
pub mod record;
pub mod skill;
pub mod user;
pub mod value;
