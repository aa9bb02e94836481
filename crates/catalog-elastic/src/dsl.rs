//! Query DSL rendering.

use std::ops::Bound;

use serde_json::{json, Map, Value};

use catalog_core::query::{Field, Fuzziness, QueryClause, SearchRequest};
use catalog_core::{Error, Product, Result};

/// Index body for `PUT /{index}`. `name.keyword` backs prefix suggestions.
pub fn mappings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                },
                "description": { "type": "text" },
                "manufacturer": { "type": "keyword" },
                "category": { "type": "keyword" },
                "price": { "type": "double" }
            }
        }
    })
}

fn keyword_field(field: Field) -> String {
    match field {
        Field::Name | Field::Description => format!("{}.keyword", field.as_str()),
        other => other.as_str().to_string(),
    }
}

fn fuzziness(value: Fuzziness) -> Value {
    match value {
        Fuzziness::Auto => json!("AUTO"),
        Fuzziness::Fixed(n) => json!(n),
    }
}

/// Escapes the wildcard metacharacters so `text` matches literally.
fn escape_wildcard(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn query(clause: &QueryClause) -> Value {
    match clause {
        QueryClause::MatchNone => json!({ "match_none": {} }),
        QueryClause::MultiMatch { text, fields, fuzziness: fuzz } => {
            let fields: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
            json!({ "multi_match": { "query": text, "fields": fields, "fuzziness": fuzziness(*fuzz) } })
        }
        QueryClause::Prefix { field, prefix } => {
            json!({ "prefix": { keyword_field(*field): { "value": prefix, "case_insensitive": true } } })
        }
        QueryClause::Contains { field, text } => {
            let pattern = format!("*{}*", escape_wildcard(text));
            json!({ "wildcard": { keyword_field(*field): { "value": pattern, "case_insensitive": true } } })
        }
        QueryClause::Terms(pairs) => {
            let filters: Vec<Value> = pairs
                .iter()
                .map(|(field, value)| json!({ "term": { field.as_str(): value } }))
                .collect();
            json!({ "bool": { "filter": filters } })
        }
        QueryClause::Range { field, lower, upper } => {
            let mut bounds = Map::new();
            match lower {
                Bound::Included(v) => { bounds.insert("gte".into(), json!(v)); }
                Bound::Excluded(v) => { bounds.insert("gt".into(), json!(v)); }
                Bound::Unbounded => {}
            }
            match upper {
                Bound::Included(v) => { bounds.insert("lte".into(), json!(v)); }
                Bound::Excluded(v) => { bounds.insert("lt".into(), json!(v)); }
                Bound::Unbounded => {}
            }
            json!({ "range": { field.as_str(): bounds } })
        }
    }
}

/// `POST /{index}/_search` body. Unbounded requests are capped at `max_results`.
pub fn search_body(request: &SearchRequest, max_results: usize) -> Value {
    json!({ "query": query(&request.clause), "size": request.size.unwrap_or(max_results) })
}

/// NDJSON body for `POST /_bulk`: one `index` action line and one source line
/// per product, newline terminated.
pub fn bulk_body(index: &str, products: &[&Product]) -> Result<String> {
    let mut body = String::new();
    for product in products {
        let action = match product.id() {
            Some(id) => json!({ "index": { "_index": index, "_id": id } }),
            None => json!({ "index": { "_index": index } }),
        };
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(product).map_err(|e| Error::operation("encode product", e))?);
        body.push('\n');
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::query::QueryBuilder;

    #[test]
    fn full_text_renders_auto_fuzziness() {
        let body = search_body(&QueryBuilder::full_text("blue shirt"), 10_000);
        assert_eq!(body["size"], 10_000);
        assert_eq!(body["query"]["multi_match"]["query"], "blue shirt");
        assert_eq!(body["query"]["multi_match"]["fields"], json!(["name", "description"]));
        assert_eq!(body["query"]["multi_match"]["fuzziness"], "AUTO");
    }

    #[test]
    fn by_name_is_exact() {
        let body = query(&QueryBuilder::by_name("shirt").clause);
        assert_eq!(body["multi_match"]["fuzziness"], 0);
        assert_eq!(body["multi_match"]["fields"], json!(["name"]));
    }

    #[test]
    fn suggestions_use_keyword_prefix() {
        let body = search_body(&QueryBuilder::suggestions("Horn", 5), 10_000);
        assert_eq!(body["size"], 5);
        assert_eq!(body["query"], json!({ "prefix": { "name.keyword": { "value": "Horn", "case_insensitive": true } } }));
    }

    #[test]
    fn name_containing_uses_escaped_wildcard() {
        let body = query(&QueryBuilder::name_containing("by E").clause);
        assert_eq!(body, json!({ "wildcard": { "name.keyword": { "value": "*by E*", "case_insensitive": true } } }));

        let literal = query(&QueryBuilder::name_containing("50*?").clause);
        assert_eq!(literal["wildcard"]["name.keyword"]["value"], "*50\\*\\?*");
    }

    #[test]
    fn infinite_price_bounds_are_left_open() {
        let below = query(&QueryBuilder::price_range(f64::NEG_INFINITY, 100.0).clause);
        assert_eq!(below, json!({ "range": { "price": { "lt": 100.0 } } }));
        let above = query(&QueryBuilder::price_range(10.0, f64::INFINITY).clause);
        assert_eq!(above, json!({ "range": { "price": { "gt": 10.0 } } }));
    }

    #[test]
    fn filters_and_ranges() {
        let terms = query(&QueryBuilder::manufacturer_and_category("Acme", "Toys").clause);
        assert_eq!(terms["bool"]["filter"], json!([{ "term": { "manufacturer": "Acme" } }, { "term": { "category": "Toys" } }]));

        let range = query(&QueryBuilder::price_range(10.0, 100.0).clause);
        assert_eq!(range, json!({ "range": { "price": { "gt": 10.0, "lt": 100.0 } } }));

        let inclusive = query(&QueryClause::Range { field: Field::Price, lower: Bound::Included(1.0), upper: Bound::Unbounded });
        assert_eq!(inclusive, json!({ "range": { "price": { "gte": 1.0 } } }));
    }

    #[test]
    fn bulk_body_omits_missing_ids() {
        let with_id = Product::builder("Blue Shirt").id("p1").build().unwrap();
        let without = Product::builder("Hornby Express").build().unwrap();
        let body = bulk_body("productindex", &[&with_id, &without]).unwrap();
        let lines: Vec<Value> = body.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], json!({ "index": { "_index": "productindex", "_id": "p1" } }));
        assert_eq!(lines[1]["name"], "Blue Shirt");
        assert_eq!(lines[2], json!({ "index": { "_index": "productindex" } }));
        assert!(lines[3].get("id").is_none());
        assert!(body.ends_with('\n'));
    }
}
