//! Line identifier to display color lookup

use crate::Result;
use std::collections::HashMap;
use std::path::Path;

/// Official colors of the Paris metro lines, branches included
const PARIS_METRO_COLORS: &[(&str, &str)] = &[
    ("1", "#ffcd07"),
    ("2", "#006db8"),
    ("3", "#9b993a"),
    ("3B", "#87d3df"),
    ("4", "#bb499b"),
    ("5", "#f6904b"),
    ("6", "#76c695"),
    ("7", "#f69fb4"),
    ("7B", "#84c28e"),
    ("8", "#c5a3cd"),
    ("9", "#cec929"),
    ("10", "#e0b03c"),
    ("11", "#8d6639"),
    ("12", "#008c5a"),
    ("13", "#87d3df"),
    ("14", "#662d91"),
];

/// Immutable mapping from line identifier to hex color
///
/// A miss is not an error: callers draw with their default stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorResolver {
    colors: HashMap<String, String>,
}

impl ColorResolver {
    /// Create a resolver from `(line, color)` pairs
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            colors: entries
                .into_iter()
                .map(|(line, color)| (line.into(), color.into()))
                .collect(),
        }
    }

    /// Load a resolver from a JSON object such as `{"1": "#ffcd07"}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let colors: HashMap<String, String> =
            serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::info!("Loaded {} line colors from {}", colors.len(), path.display());
        Ok(Self { colors })
    }

    /// Color of a line, `None` for unknown or empty identifiers
    pub fn lookup(&self, line_id: Option<&str>) -> Option<&str> {
        let line_id = line_id.filter(|id| !id.is_empty())?;
        self.colors.get(line_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new(PARIS_METRO_COLORS.iter().copied())
    }
}
