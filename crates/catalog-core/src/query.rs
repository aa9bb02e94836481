//! Query construction: user intents to backend-neutral search requests.
//!
//! Engines compile a [`SearchRequest`] into their own query language; this
//! module owns the matching semantics (which fields, fuzziness, bounds, size).

use std::ops::Bound;

/// Indexed product fields that a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Manufacturer,
    Category,
    Price,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Manufacturer => "manufacturer",
            Self::Category => "category",
            Self::Price => "price",
        }
    }
}

/// Edit-distance tolerance for fuzzy term matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuzziness {
    /// Scales with term length: 1-2 chars exact, 3-5 chars one edit, longer two.
    Auto,
    Fixed(u8),
}

impl Fuzziness {
    pub fn max_edits(self, term: &str) -> u8 {
        match self {
            Self::Fixed(n) => n,
            Self::Auto => match term.chars().count() {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// Matches nothing; the facade answers it without an engine call.
    MatchNone,
    /// Analyzed match of `text` against any of `fields`, one clause per term.
    MultiMatch { text: String, fields: Vec<Field>, fuzziness: Fuzziness },
    /// Case-insensitive literal prefix of the whole field value.
    Prefix { field: Field, prefix: String },
    /// Case-insensitive literal substring of the whole field value.
    Contains { field: Field, text: String },
    /// Conjunction of exact, case-sensitive term matches.
    Terms(Vec<(Field, String)>),
    Range { field: Field, lower: Bound<f64>, upper: Bound<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub clause: QueryClause,
    /// `None` asks for every match.
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn unbounded(clause: QueryClause) -> Self { Self { clause, size: None } }

    pub fn matches_nothing(&self) -> bool {
        matches!(self.clause, QueryClause::MatchNone) || self.size == Some(0)
    }
}

pub struct QueryBuilder;

impl QueryBuilder {
    /// Fuzzy search over name and description. Blank text matches nothing.
    pub fn full_text(text: &str) -> SearchRequest {
        let text = text.trim();
        if text.is_empty() {
            return SearchRequest::unbounded(QueryClause::MatchNone);
        }
        SearchRequest::unbounded(QueryClause::MultiMatch {
            text: text.to_string(),
            fields: vec![Field::Name, Field::Description],
            fuzziness: Fuzziness::Auto,
        })
    }

    /// Names starting with `prefix`. An empty prefix matches every product.
    pub fn suggestions(prefix: &str, limit: usize) -> SearchRequest {
        SearchRequest {
            clause: QueryClause::Prefix { field: Field::Name, prefix: prefix.to_string() },
            size: Some(limit),
        }
    }

    /// Names containing `text` anywhere. Blank text matches nothing.
    pub fn name_containing(text: &str) -> SearchRequest {
        let text = text.trim();
        if text.is_empty() {
            return SearchRequest::unbounded(QueryClause::MatchNone);
        }
        SearchRequest::unbounded(QueryClause::Contains { field: Field::Name, text: text.to_string() })
    }

    pub fn manufacturer_and_category(manufacturer: &str, category: &str) -> SearchRequest {
        SearchRequest::unbounded(QueryClause::Terms(vec![
            (Field::Manufacturer, manufacturer.to_string()),
            (Field::Category, category.to_string()),
        ]))
    }

    pub fn by_manufacturer(manufacturer: &str) -> SearchRequest {
        SearchRequest::unbounded(QueryClause::Terms(vec![(Field::Manufacturer, manufacturer.to_string())]))
    }

    /// Non-fuzzy analyzed match on the name only.
    pub fn by_name(name: &str) -> SearchRequest {
        let name = name.trim();
        if name.is_empty() {
            return SearchRequest::unbounded(QueryClause::MatchNone);
        }
        SearchRequest::unbounded(QueryClause::MultiMatch {
            text: name.to_string(),
            fields: vec![Field::Name],
            fuzziness: Fuzziness::Fixed(0),
        })
    }

    /// Prices strictly between `lower` and `upper`. NaN or unordered bounds
    /// match nothing; an infinite bound leaves that side open.
    pub fn price_range(lower: f64, upper: f64) -> SearchRequest {
        if lower.is_nan() || upper.is_nan() || lower >= upper {
            return SearchRequest::unbounded(QueryClause::MatchNone);
        }
        let bound = |v: f64| if v.is_finite() { Bound::Excluded(v) } else { Bound::Unbounded };
        SearchRequest::unbounded(QueryClause::Range { field: Field::Price, lower: bound(lower), upper: bound(upper) })
    }
}
