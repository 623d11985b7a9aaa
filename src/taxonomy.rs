//! Taxonomic rank vocabulary used by header handling and the run summary.

use serde::{Deserialize, Serialize};

/// Placeholder for a rank with no assignment in the source data.
pub const UNCLASSIFIED: &str = ".";

/// The ranks carried in a reference header, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    /// All ranks in hierarchical order.
    pub fn all() -> [Rank; 7] {
        [
            Rank::Kingdom,
            Rank::Phylum,
            Rank::Class,
            Rank::Order,
            Rank::Family,
            Rank::Genus,
            Rank::Species,
        ]
    }
}

/// True when a header field carries no classification, i.e. it is empty or
/// the `.` placeholder.
pub fn is_unclassified(field: &str) -> bool {
    let field = field.trim();
    field.is_empty() || field == UNCLASSIFIED
}
