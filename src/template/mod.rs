use std::collections::HashMap;

mod scanner;

use scanner::{Scanner, State};

use crate::error::SqlSessionError;
use crate::params::Parameter;

/// Name of each named placeholder mapped to the 0-based positions of the `?` markers it fills.
pub type ReplacementMap = HashMap<String, Vec<usize>>;

/// A statement plus the values to bind into it.
///
/// Named placeholders (`:name`) are extracted once, when the query is built. The clean statement
/// carries one `?` per occurrence, so a name used twice fills two slots from one value:
/// ```rust
/// use sql_session::prelude::*;
///
/// let query = Query::new("SELECT * FROM t WHERE a = :x AND b = :x").bind_named("x", 5_i64);
/// assert_eq!(query.clean_statement(), "SELECT * FROM t WHERE a = ? AND b = ?");
/// assert_eq!(query.replacement_map()["x"], vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    statement: String,
    params: Vec<Parameter>,
    param_map: HashMap<String, Parameter>,
    replacement_map: ReplacementMap,
    clean_statement: String,
    bare_markers: usize,
}

impl Query {
    #[must_use]
    pub fn new(statement: impl Into<String>) -> Self {
        let statement = statement.into();
        let scanned = scan(&statement);
        Self {
            statement,
            params: Vec::new(),
            param_map: HashMap::new(),
            replacement_map: scanned.replacements,
            clean_statement: scanned.clean,
            bare_markers: scanned.bare_markers,
        }
    }

    /// Build a query bound positionally.
    #[must_use]
    pub fn with_params(statement: impl Into<String>, params: Vec<Parameter>) -> Self {
        let mut query = Self::new(statement);
        query.params = params;
        query
    }

    /// Build a query bound by name.
    #[must_use]
    pub fn with_named(
        statement: impl Into<String>,
        param_map: HashMap<String, Parameter>,
    ) -> Self {
        let mut query = Self::new(statement);
        query.param_map = param_map;
        query
    }

    /// Append a positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Parameter>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Set a named parameter, replacing any earlier value for `name`.
    #[must_use]
    pub fn bind_named(mut self, name: impl Into<String>, value: impl Into<Parameter>) -> Self {
        self.param_map.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn clean_statement(&self) -> &str {
        &self.clean_statement
    }

    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[must_use]
    pub fn param_map(&self) -> &HashMap<String, Parameter> {
        &self.param_map
    }

    #[must_use]
    pub fn replacement_map(&self) -> &ReplacementMap {
        &self.replacement_map
    }

    /// Whether binding goes through the replacement map rather than `params`.
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.replacement_map.is_empty()
    }

    /// Number of bare `?` markers written directly in the statement.
    #[must_use]
    pub fn bare_markers(&self) -> usize {
        self.bare_markers
    }

    /// Parameters in `?` marker order, resolving named occurrences through `values`.
    ///
    /// Names are checked in order of first appearance, so a missing value is always reported
    /// for the leftmost placeholder.
    ///
    /// # Errors
    ///
    /// Returns `SqlSessionError::ParameterError` if the statement mixes bare `?` markers with
    /// named placeholders, or `SqlSessionError::MissingParameter` for a placeholder without a
    /// value.
    pub fn resolve_named<'p>(
        &self,
        values: &'p HashMap<String, Parameter>,
    ) -> Result<Vec<(usize, &'p Parameter)>, SqlSessionError> {
        if self.bare_markers > 0 && self.is_named() {
            return Err(SqlSessionError::ParameterError(format!(
                "statement mixes {} bare `?` marker(s) with named placeholders",
                self.bare_markers
            )));
        }
        let mut names: Vec<(&String, &Vec<usize>)> = self.replacement_map.iter().collect();
        names.sort_unstable_by_key(|(_, occurrences)| occurrences.first().copied());

        let mut slots = Vec::new();
        for (name, occurrences) in names {
            let param = values
                .get(name)
                .ok_or_else(|| SqlSessionError::MissingParameter(name.clone()))?;
            slots.extend(occurrences.iter().map(|&pos| (pos, param)));
        }
        slots.sort_unstable_by_key(|(pos, _)| *pos);
        Ok(slots)
    }
}

struct Scanned {
    clean: String,
    replacements: ReplacementMap,
    bare_markers: usize,
}

/// Replace every `:name` placeholder with `?` and record where each name landed.
///
/// Quoted strings and identifiers, comments, dollar-quoted bodies and `::` casts pass through
/// untouched. Returns the statement unchanged with an empty map when nothing is named.
///
/// Bare `?` markers already in the statement take their own positions in the map's numbering.
#[must_use]
pub fn extract_named_parameters(sql: &str) -> (String, ReplacementMap) {
    let scanned = scan(sql);
    (scanned.clean, scanned.replacements)
}

fn scan(sql: &str) -> Scanned {
    let scanner = Scanner::new(sql);
    let mut replacements = ReplacementMap::new();
    let mut bare_markers = 0;
    let mut clean: Option<String> = None;
    let mut copied_to = 0;
    let mut marker = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < scanner.len() {
        let Some(b) = scanner.at(idx) else { break };
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if scanner.line_comment_starts(idx) => state = State::LineComment,
                _ if scanner.block_comment_starts(idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, tag_end)) = scanner.dollar_quote_opens(idx) {
                        state = State::DollarQuoted(tag);
                        idx = tag_end;
                    }
                }
                b'?' => {
                    bare_markers += 1;
                    marker += 1;
                    idx = scanner.digits_end(idx + 1) - 1;
                }
                b':' if scanner.at(idx + 1) == Some(b':') => {
                    // type cast
                    idx += 1;
                }
                b':' => {
                    if let Some((end, name)) = scanner.placeholder_name(idx) {
                        let buf = clean.get_or_insert_with(|| String::with_capacity(sql.len()));
                        buf.push_str(&sql[copied_to..idx]);
                        buf.push('?');
                        copied_to = end;
                        replacements
                            .entry(name.to_string())
                            .or_default()
                            .push(marker);
                        marker += 1;
                        idx = end - 1;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if scanner.at(idx + 1) == Some(b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if scanner.at(idx + 1) == Some(b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if scanner.block_comment_starts(idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if scanner.block_comment_ends(idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && scanner.dollar_quote_closes(idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    let clean = match clean {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            buf
        }
        None => sql.to_string(),
    };
    Scanned {
        clean,
        replacements,
        bare_markers,
    }
}
