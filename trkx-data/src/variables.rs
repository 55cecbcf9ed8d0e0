//! Reader variables and their cartesian product
//!
//! Every top-level configuration key outside the reserved blocks declares a
//! variable. A declaration is one source mapping or a list of them; values of
//! all sources concatenate in order.
//!
//! ```yaml
//! evtid:
//!   range: [1000, 1010]
//! split:
//!   - constant: train
//!   - list: [val, test]
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde_yaml::Value as YamlValue;
use trkx_data_core::Value;

use crate::error::{Error, Result};
use crate::template::Bindings;

/// Source keys in the order they are recognized within one entry
const SOURCE_KEYS: [&str; 4] = ["range", "indices", "list", "constant"];

/// One value source of a variable declaration
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSource {
    /// Integers from `start` up to, not including, `end`
    Range {
        /// First value
        start: i64,
        /// Exclusive bound
        end: i64,
        /// Increment, never zero
        step: i64,
    },

    /// Explicit values, `indices` or `list`
    List(Vec<Value>),

    /// A single value
    Constant(Value),
}

impl VariableSource {
    /// Parse one entry mapping; `key` is the entry's position for errors
    pub fn from_yaml(key: &str, entry: &YamlValue) -> Result<Self> {
        let YamlValue::Mapping(mapping) = entry else {
            return Err(Error::config(key, "variable entry must be a mapping"));
        };

        let Some((source, value)) = SOURCE_KEYS
            .iter()
            .find_map(|&source| mapping.get(source).map(|value| (source, value)))
        else {
            return Err(Error::config(
                key,
                format!("expected one of: {}", SOURCE_KEYS.join(", ")),
            ));
        };

        let key = format!("{key}.{source}");
        match source {
            "range" => parse_range(&key, value),
            "constant" => Ok(VariableSource::Constant(parse_value(&key, value)?)),
            _ => {
                let YamlValue::Sequence(items) = value else {
                    return Err(Error::config(key, "expected a list of values"));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| parse_value(&format!("{key}[{i}]"), item))
                    .collect::<Result<Vec<_>>>()
                    .map(VariableSource::List)
            }
        }
    }

    /// Values produced by this source
    pub fn values(&self) -> Vec<Value> {
        match self {
            VariableSource::Range { start, end, step } => range_values(*start, *end, *step),
            VariableSource::List(values) => values.clone(),
            VariableSource::Constant(value) => vec![value.clone()],
        }
    }
}

fn parse_value(key: &str, value: &YamlValue) -> Result<Value> {
    match value {
        YamlValue::Bool(_) | YamlValue::Number(_) | YamlValue::String(_) => {
            serde_yaml::from_value(value.clone())
                .map_err(|e| Error::config(key, format!("unsupported value: {e}")))
        }
        _ => Err(Error::config(key, "expected a scalar value")),
    }
}

fn parse_range(key: &str, value: &YamlValue) -> Result<VariableSource> {
    let bounds = match value {
        YamlValue::Sequence(items) => items
            .iter()
            .map(YamlValue::as_i64)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::config(key, "range bounds must be integers"))?,
        _ => return Err(Error::config(key, "expected [start, end] or [start, end, step]")),
    };

    let (start, end, step) = match bounds.as_slice() {
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => return Err(Error::config(key, "expected [start, end] or [start, end, step]")),
    };
    if step == 0 {
        return Err(Error::config(key, "range step must not be zero"));
    }

    Ok(VariableSource::Range { start, end, step })
}

fn range_values(start: i64, end: i64, step: i64) -> Vec<Value> {
    let mut values = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        values.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    values
}

/// Parse a variable declaration into its ordered value list
pub fn parse_declaration(name: &str, declaration: &YamlValue) -> Result<Vec<Value>> {
    let sources = match declaration {
        YamlValue::Sequence(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| VariableSource::from_yaml(&format!("{name}[{i}]"), entry))
            .collect::<Result<Vec<_>>>()?,
        entry => vec![VariableSource::from_yaml(name, entry)?],
    };

    Ok(sources.iter().flat_map(VariableSource::values).collect())
}

/// Ordered variable table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: IndexMap<String, Vec<Value>>,
}

impl Variables {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every declaration, keeping declaration order
    pub fn from_declarations(declarations: &IndexMap<String, YamlValue>) -> Result<Self> {
        let mut variables = Self::new();
        for (name, declaration) in declarations {
            variables.set(name.clone(), parse_declaration(name, declaration)?);
        }
        Ok(variables)
    }

    /// Replace a variable's values, appending it if it is new
    pub fn set(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.values.insert(name.into(), values);
    }

    /// Pin a variable to a single value
    pub fn pin(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, vec![value.into()]);
    }

    /// Values of one variable
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Variable names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over `(name, values)` in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.values.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no variable is declared
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of combinations
    pub fn combination_count(&self) -> usize {
        self.values.values().map(Vec::len).product()
    }

    /// Enumerate every combination; the first variable varies slowest
    pub fn combinations(&self) -> Combinations {
        Combinations::new(self.values.clone())
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in &self.values {
            let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
            writeln!(f, "{name} ({}): [{}]", values.len(), rendered.join(", "))?;
        }
        Ok(())
    }
}

/// Iterator over the cartesian product of a variable table
#[derive(Debug, Clone)]
pub struct Combinations {
    variables: Vec<(String, Vec<Value>)>,
    cursor: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(variables: IndexMap<String, Vec<Value>>) -> Self {
        let variables: Vec<_> = variables.into_iter().collect();
        let done = variables.iter().any(|(_, values)| values.is_empty());
        Self {
            cursor: vec![0; variables.len()],
            variables,
            done,
        }
    }

    /// Advance the rightmost position, carrying leftwards
    fn advance(&mut self) {
        for position in (0..self.cursor.len()).rev() {
            self.cursor[position] += 1;
            if self.cursor[position] < self.variables[position].1.len() {
                return;
            }
            self.cursor[position] = 0;
        }
        self.done = true;
    }
}

impl Iterator for Combinations {
    type Item = Bindings;

    fn next(&mut self) -> Option<Bindings> {
        if self.done {
            return None;
        }

        let bindings = self
            .variables
            .iter()
            .zip(&self.cursor)
            .map(|((name, values), &index)| (name.clone(), values[index].clone()))
            .collect();
        self.advance();
        Some(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn yaml(source: &str) -> YamlValue {
        serde_yaml::from_str(source).unwrap()
    }

    fn ints(values: &[Value]) -> Vec<i64> {
        values.iter().filter_map(Value::as_i64).collect()
    }

    #[test_case("range: [3, 6]", &[3, 4, 5] ; "range")]
    #[test_case("range: [6, 3]", &[] ; "reversed range")]
    #[test_case("range: [0, 10, 4]", &[0, 4, 8] ; "stepped range")]
    #[test_case("range: [5, 0, -2]", &[5, 3, 1] ; "negative step")]
    #[test_case("indices: [7, 2, 9]", &[7, 2, 9] ; "indices")]
    #[test_case("constant: 42", &[42] ; "constant")]
    #[test_case("[{constant: 1}, {range: [5, 7]}, {list: [0]}]", &[1, 5, 6, 0] ; "mixed entries")]
    fn test_declaration_values(source: &str, expected: &[i64]) {
        let values = parse_declaration("evtid", &yaml(source)).unwrap();
        assert_eq!(ints(&values), expected);
    }

    #[test]
    fn test_first_recognized_key_wins() {
        let values = parse_declaration("evtid", &yaml("{constant: 9, range: [0, 2]}")).unwrap();
        assert_eq!(ints(&values), vec![0, 1]);
    }

    #[test]
    fn test_string_values() {
        let values = parse_declaration("split", &yaml("list: [train, val]")).unwrap();
        assert_eq!(values, vec![Value::from("train"), Value::from("val")]);
    }

    #[test_case("{}", "split" ; "no source key")]
    #[test_case("range: [1]", "split.range" ; "short range")]
    #[test_case("range: [0, 4, 0]", "split.range" ; "zero step")]
    #[test_case("range: [a, b]", "split.range" ; "non integer bounds")]
    #[test_case("list: 3", "split.list" ; "list not a sequence")]
    #[test_case("constant: [1, 2]", "split.constant" ; "non scalar constant")]
    #[test_case("[{list: [a]}, 5]", "split[1]" ; "entry not a mapping")]
    fn test_declaration_errors(source: &str, expected_key: &str) {
        match parse_declaration("split", &yaml(source)) {
            Err(Error::Config { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_combinations_order() {
        let mut variables = Variables::new();
        variables.set("a", vec![Value::Int(1), Value::Int(2)]);
        variables.set("b", vec![Value::from("x"), Value::from("y"), Value::from("z")]);

        let rendered: Vec<String> = variables
            .combinations()
            .map(|b| format!("{}{}", b["a"], b["b"]))
            .collect();
        assert_eq!(rendered, vec!["1x", "1y", "1z", "2x", "2y", "2z"]);
        assert_eq!(variables.combination_count(), 6);
    }

    #[test]
    fn test_no_variables_yields_one_empty_combination() {
        let combinations: Vec<_> = Variables::new().combinations().collect();
        assert_eq!(combinations.len(), 1);
        assert!(combinations[0].is_empty());
    }

    #[test]
    fn test_empty_variable_yields_nothing() {
        let mut variables = Variables::new();
        variables.set("a", vec![Value::Int(1)]);
        variables.set("b", Vec::new());
        assert_eq!(variables.combinations().count(), 0);
        assert_eq!(variables.combination_count(), 0);
    }

    #[test]
    fn test_pin_replaces_and_appends() {
        let mut variables =
            Variables::from_declarations(&serde_yaml::from_str("evtid: {range: [0, 5]}").unwrap())
                .unwrap();
        variables.pin("evtid", 3_i64);
        variables.pin("split", "train");

        assert_eq!(variables.get("evtid"), Some(&[Value::Int(3)][..]));
        assert_eq!(variables.names().collect::<Vec<_>>(), vec!["evtid", "split"]);
    }

    proptest! {
        #[test]
        fn test_range_matches_half_open_interval(start in -50i64..50, len in 0i64..40) {
            let end = start + len;
            let values = range_values(start, end, 1);
            prop_assert_eq!(ints(&values), (start..end).collect::<Vec<_>>());
        }

        #[test]
        fn test_product_count_and_order(lens in prop::collection::vec(1usize..4, 0..4)) {
            let mut variables = Variables::new();
            for (i, len) in lens.iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let values = (0..*len).map(|v| Value::Int(v as i64)).collect();
                variables.set(format!("v{i}"), values);
            }

            let combinations: Vec<Bindings> = variables.combinations().collect();
            prop_assert_eq!(combinations.len(), lens.iter().product::<usize>());

            // Lexicographic in declaration order means the outer variable varies slowest
            let keys: Vec<Vec<i64>> = combinations
                .iter()
                .map(|b| b.values().filter_map(Value::as_i64).collect())
                .collect();
            let mut sorted = keys.clone();
            sorted.sort();
            prop_assert_eq!(keys, sorted);
        }
    }
}
