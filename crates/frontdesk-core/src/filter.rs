use anyhow::anyhow;
use tracing::trace;

use crate::stay::{Room, RoomCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    One(RoomCategory),
}

impl CategoryFilter {
    fn matches(&self, category: RoomCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::One(wanted) => *wanted == category,
        }
    }
}

/// Which rooms appear in the grid. Inactive rooms are excluded no
/// matter what the search and category inputs say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl RoomFilter {
    /// Builds a filter from CLI terms. `type:<cat>` (alias `category:`)
    /// selects a category; every other term is free-text room-number
    /// search, joined with spaces when repeated.
    pub fn parse(terms: &[String]) -> anyhow::Result<Self> {
        let mut filter = Self::default();
        let mut search_terms: Vec<&str> = Vec::new();

        for term in terms {
            let value = term
                .strip_prefix("type:")
                .or_else(|| term.strip_prefix("category:"));

            if let Some(value) = value {
                filter.category = parse_category_term(value)?;
                continue;
            }

            search_terms.push(term.as_str());
        }

        filter.search = search_terms.join(" ");
        Ok(filter)
    }

    pub fn matches(&self, room: &Room) -> bool {
        if !room.active {
            return false;
        }

        let search_hit = self.search.is_empty()
            || room
                .number
                .to_lowercase()
                .contains(&self.search.to_lowercase());

        let ok = search_hit && self.category.matches(room.category);
        trace!(room = %room.number, ok, "room filter evaluation");
        ok
    }
}

fn parse_category_term(value: &str) -> anyhow::Result<CategoryFilter> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(CategoryFilter::All);
    }

    RoomCategory::parse(value)
        .map(CategoryFilter::One)
        .ok_or_else(|| anyhow!("unknown room category: {value}"))
}
