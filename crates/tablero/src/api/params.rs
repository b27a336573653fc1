//! Mapping committed filters to wire query parameters.

use tablero_core::logging::targets;

use crate::filter::FilterState;
use crate::query::PageRequest;

/// How a filter value is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Sent verbatim.
    Text,
    /// Parsed as an integer. Values that do not parse are dropped.
    Integer,
}

/// Maps one filter key of a view to one query parameter of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    /// Filter key in the [`FilterState`].
    pub filter: &'static str,
    /// Parameter name on the wire.
    pub param: &'static str,
    /// Value conversion.
    pub kind: ParamKind,
}

impl ParamSpec {
    /// A text parameter.
    pub const fn text(filter: &'static str, param: &'static str) -> Self {
        Self {
            filter,
            param,
            kind: ParamKind::Text,
        }
    }

    /// An integer parameter.
    pub const fn integer(filter: &'static str, param: &'static str) -> Self {
        Self {
            filter,
            param,
            kind: ParamKind::Integer,
        }
    }
}

/// Flat, ordered query parameters. A multi-valued filter repeats its name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// No parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate committed filters through `specs`.
    ///
    /// Filter keys without a spec are not sent.
    pub fn from_filters(filters: &FilterState, specs: &[ParamSpec]) -> Self {
        let mut params = Self::new();
        for spec in specs {
            let Some(value) = filters.get(spec.filter) else {
                continue;
            };
            for raw in value.values() {
                match spec.kind {
                    ParamKind::Text => params.push(spec.param, raw),
                    ParamKind::Integer => match raw.trim().parse::<i64>() {
                        Ok(number) => params.push(spec.param, number.to_string()),
                        Err(_) => {
                            tracing::warn!(
                                target: targets::API,
                                filter = spec.filter,
                                value = raw,
                                "dropping non-numeric filter value"
                            );
                        }
                    },
                }
            }
        }
        params
    }

    /// Append one pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append `page` and `page_size`.
    #[must_use]
    pub fn with_page(self, page: PageRequest) -> Self {
        self.with("page", page.page.to_string())
            .with("page_size", page.page_size.to_string())
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name`, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The pairs in order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Take the pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;

    const SPECS: &[ParamSpec] = &[
        ParamSpec::integer("anio", "anio"),
        ParamSpec::integer("ue", "ue_id"),
        ParamSpec::text("fuenteFinanciamiento", "fuente"),
        ParamSpec::text("estado", "estado"),
    ];

    #[test]
    fn test_aliases_and_integer_parsing() {
        let filters = FilterState::new()
            .with("anio", "2026")
            .with("ue", " 7 ")
            .with("fuenteFinanciamiento", "RO")
            .with("sinMapeo", "x");
        let params = QueryParams::from_filters(&filters, SPECS);
        assert_eq!(params.get("anio"), Some("2026"));
        assert_eq!(params.get("ue_id"), Some("7"));
        assert_eq!(params.get("fuente"), Some("RO"));
        assert_eq!(params.get("sinMapeo"), None);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_non_numeric_value_is_dropped() {
        let filters = FilterState::new().with("anio", "todos");
        assert!(QueryParams::from_filters(&filters, SPECS).is_empty());
    }

    #[test]
    fn test_multi_value_repeats_name() {
        let filters = FilterState::new().with(
            "estado",
            FilterValue::from(vec!["CONVOCADO", "", "ADJUDICADO"]),
        );
        let params = QueryParams::from_filters(&filters, SPECS);
        assert_eq!(params.get_all("estado"), vec!["CONVOCADO", "ADJUDICADO"]);
    }

    #[test]
    fn test_page_params() {
        let params = QueryParams::new().with_page(PageRequest::new(2, 20));
        assert_eq!(
            params.into_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("page_size".to_string(), "20".to_string())
            ]
        );
    }
}
