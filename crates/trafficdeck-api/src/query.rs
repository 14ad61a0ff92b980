// ── SELECT / COUNT query description ──
//
// A backend query is a table name, a set of exact-match predicates, and an
// optional descending order. It renders to PostgREST query pairs.

/// Value that imposes no constraint when used as a filter.
pub const MATCH_ALL: &str = "all";

/// Sort direction for an ordered fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A SELECT/COUNT query against one backend table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    predicates: Vec<(String, String)>,
    order: Option<(String, Direction)>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
            order: None,
        }
    }

    /// Add an exact-match predicate.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push((column.into(), value.into()));
        self
    }

    /// Add an exact-match predicate unless the value is absent or `"all"`.
    pub fn filter(self, column: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if v != MATCH_ALL => self.eq(column, v),
            _ => self,
        }
    }

    /// Order results by `column`, newest first.
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some((column.into(), Direction::Desc));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[(String, String)] {
        &self.predicates
    }

    /// Render as PostgREST query-string pairs: `col=eq.value`, `order=col.desc`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .predicates
            .iter()
            .map(|(col, val)| (col.clone(), format!("eq.{val}")))
            .collect();
        if let Some((col, dir)) = &self.order {
            let dir = match dir {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            pairs.push(("order".into(), format!("{col}.{dir}")));
        }
        pairs
    }
}
