/// Sort column; `descending` renders as a `-` prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn render(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Filters for `GET /tables/{collection}`
///
/// Each search predicate becomes its own `search=field:value` parameter;
/// sort keys are joined with commas into a single `sort` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Vec<(String, String)>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Vec<SortKey>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.search.push((field.into(), value.to_string()));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort.push(SortKey::asc(field));
        self
    }

    pub fn sort_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push(SortKey::desc(field));
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = self
            .search
            .iter()
            .map(|(field, value)| ("search", format!("{}:{}", field, value)))
            .collect();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(SortKey::render)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("sort", sort));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_has_no_params() {
        assert!(ListQuery::new().to_query_pairs().is_empty());
    }

    #[test]
    fn test_search_predicates_repeat() {
        let pairs = ListQuery::new()
            .search("featured", true)
            .search("publie", true)
            .limit(3)
            .to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("search", "featured:true".to_string()),
                ("search", "publie:true".to_string()),
                ("limit", "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_is_comma_joined_with_descending_prefix() {
        let pairs = ListQuery::new()
            .sort_by("populaire")
            .sort_by("type")
            .sort_by_desc("date_temoignage")
            .page(2)
            .to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "2".to_string()),
                ("sort", "populaire,type,-date_temoignage".to_string()),
            ]
        );
    }
}
