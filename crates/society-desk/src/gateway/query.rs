use serde::Serialize;
use serde_json::Value;

/// Filter condition applied to a remote table query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    Gte { column: String, value: Value },
    Lt { column: String, value: Value },
    Lte { column: String, value: Value },
    /// Case-insensitive substring match.
    ILike { column: String, needle: String },
    /// Matches when any of the nested predicates match.
    Any { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn one_of<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self::Gte {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn lt(column: &str, value: impl Into<Value>) -> Self {
        Self::Lt {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Self::Lte {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn ilike(column: &str, needle: &str) -> Self {
        Self::ILike {
            column: column.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn any(predicates: Vec<Predicate>) -> Self {
        Self::Any { predicates }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Select statement against one table. Filters are AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub table: String,
    /// Empty selects every column.
    pub columns: Vec<String>,
    pub filters: Vec<Predicate>,
    pub order: Option<OrderBy>,
}

impl Query {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|column| column.to_string()).collect();
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(predicates);
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn select_clause(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }
}
