//! Typed request contract for the hosted data API
//!
//! Every remote interaction is one `Request`: a table, an operation, and the
//! predicates narrowing it. Filters are an expression tree rather than
//! interpolated strings; rendering to the backend's query syntax
//! (`id=eq.X`, `or=(specialty.eq.CS,course_id.in.(a,b))`) happens in one
//! place, below.

use serde_json::Value;

/// Filter predicate over table columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq(String, String),
    /// Column is one of the listed values
    In(String, Vec<String>),
    /// Any sub-predicate matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Eq(column.into(), value.to_string())
    }

    pub fn is_in(column: impl Into<String>, values: Vec<String>) -> Self {
        Filter::In(column.into(), values)
    }

    pub fn any(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Render as a top-level query pair (`col=eq.value` form).
    fn to_pair(&self) -> (String, String) {
        match self {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", quote(value))),
            Filter::In(column, values) => (column.clone(), format!("in.({})", quote_list(values))),
            Filter::Or(filters) => {
                let exprs: Vec<String> = filters.iter().map(Filter::to_expr).collect();
                ("or".to_string(), format!("({})", exprs.join(",")))
            }
        }
    }

    /// Render in the dotted expression form used inside `or=(...)`.
    fn to_expr(&self) -> String {
        match self {
            Filter::Eq(column, value) => format!("{}.eq.{}", column, quote(value)),
            Filter::In(column, values) => format!("{}.in.({})", column, quote_list(values)),
            Filter::Or(filters) => {
                let exprs: Vec<String> = filters.iter().map(Filter::to_expr).collect();
                format!("or({})", exprs.join(","))
            }
        }
    }

    /// Evaluate against a JSON row. Null columns never match.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => column_text(row, column).is_some_and(|text| text == *value),
            Filter::In(column, values) => {
                column_text(row, column).is_some_and(|text| values.iter().any(|v| *v == text))
            }
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Quote a filter value when it contains syntax characters.
fn quote(value: &str) -> String {
    if value.contains([',', '(', ')', '"', '.']) || value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

fn quote_list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
}

/// Result ordering. Only `created_at` is ordered on in practice.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }

    fn render(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Embedded related-table projection (foreign-key join), nestable two
/// levels deep in practice (`courses(*,teachers(*,users(*)))`).
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub relation: String,
    pub nested: Vec<Embed>,
}

impl Embed {
    pub fn table(relation: impl Into<String>) -> Self {
        Self { relation: relation.into(), nested: Vec::new() }
    }

    pub fn with(mut self, embed: Embed) -> Self {
        self.nested.push(embed);
        self
    }

    fn render(&self) -> String {
        format!("{}({})", self.relation, render_projection(&self.nested))
    }
}

fn render_projection(embeds: &[Embed]) -> String {
    let mut parts = vec!["*".to_string()];
    parts.extend(embeds.iter().map(Embed::render));
    parts.join(",")
}

/// What the request does to the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert one row, returning the created representation
    Insert { values: Value },
    Select,
    /// Partial update of every row matching the filters
    Update { changes: Value },
}

/// One declarative remote interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub table: String,
    pub op: Operation,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Request {
    fn new(table: impl Into<String>, op: Operation) -> Self {
        Self {
            table: table.into(),
            op,
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Select)
    }

    pub fn insert(table: impl Into<String>, values: Value) -> Self {
        Self::new(table, Operation::Insert { values })
    }

    pub fn update(table: impl Into<String>, changes: Value) -> Self {
        Self::new(table, Operation::Update { changes })
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the query-string pairs for the HTTP form of this request.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), render_projection(&self.embeds))];
        pairs.extend(self.filters.iter().map(Filter::to_pair));
        if let Some(ref order) = self.order {
            pairs.push(("order".to_string(), order.render()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
