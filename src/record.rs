use std::fmt;

use serde_json::Value;

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
const I64_MIN_F: f64 = i64::MIN as f64;
const I64_MAX_F: f64 = i64::MAX as f64;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Keeps the value as it came in, without any coercion.
    pub fn raw(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Null,
            Some(Value::Bool(b)) => Cell::Bool(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            Some(Value::String(s)) => Cell::Text(s.clone()),
            Some(other) => Cell::Text(other.to_string()),
        }
    }

    /// Integer if the value looks like one, otherwise the raw value.
    pub fn integer(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n
                    .as_f64()
                    .map(f64::trunc)
                    .filter(|f| (I64_MIN_F..I64_MAX_F).contains(f))
                    .map(|f| Cell::Int(f as i64))
                    .unwrap_or_else(|| Cell::raw(value)),
            },
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Cell::Int)
                .unwrap_or_else(|_| Cell::raw(value)),
            _ => Cell::raw(value),
        }
    }

    /// Float if the value looks like one, otherwise the raw value.
    pub fn float(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Cell::Float)
                .unwrap_or_else(|_| Cell::raw(value)),
            _ => Cell::raw(value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A single ranked school as the search api describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: Cell,
    pub state: Cell,
    pub city: Cell,
    pub rank: Cell,
    pub is_tied: Cell,
    pub score: Cell,
    pub url: Cell,
}

pub const COLUMN_COUNT: usize = 6;
pub const HEADERS: [&str; COLUMN_COUNT] = ["Rank", "Name", "State", "City", "Score", "URL"];

impl Record {
    /// Every field is looked up on its own. A missing key is a null cell.
    pub fn from_json(json: &Value) -> Self {
        Record {
            name: Cell::raw(json.get("name")),
            state: Cell::raw(json.get("state")),
            city: Cell::raw(json.get("city")),
            rank: Cell::integer(lookup(json, &["ranking", "display_rank"])),
            is_tied: Cell::raw(lookup(json, &["ranking", "is_tied"])),
            score: Cell::float(lookup(json, &["schoolData", "c_avg_acad_rep_score"])),
            url: Cell::raw(json.get("url")),
        }
    }

    /// The exported columns, in `HEADERS` order. The tie flag isn't exported.
    pub fn row(&self) -> [Cell; COLUMN_COUNT] {
        [
            self.rank.clone(),
            self.name.clone(),
            self.state.clone(),
            self.city.clone(),
            self.score.clone(),
            self.url.clone(),
        ]
    }
}

#[inline]
fn lookup<'a>(json: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(json, |node, key| node.get(key))
}
