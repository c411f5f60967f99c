use crate::parameter::Parameter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Report template as returned by the backend
///
/// The `parameters` are kept as the opaque tokens the backend stores; use
/// [`Template::decoded_parameters`] to work with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub report_group: String,
    #[serde(rename = "additionalInfo", default)]
    pub additional_info: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl Template {
    pub fn decoded_parameters(&self) -> Vec<Parameter> {
        self.parameters.iter().map(|token| Parameter::decode(token)).collect()
    }

    pub fn statistics(&self) -> Vec<Statistic> {
        parse_statistics(&self.additional_info)
    }
}

/// Body of `createTemplate` and `editTemplate/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    pub report_group: String,
    pub parameters: Vec<String>,
    #[serde(rename = "additionalInfo")]
    pub additional_info: String,
}

/// Aggregate the backend computes for each parameter of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Statistic {
    Max,
    Avg,
    Min,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Max, Statistic::Avg, Statistic::Min];

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Max => "MAX",
            Statistic::Avg => "AVG",
            Statistic::Min => "MIN",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MAX" => Ok(Statistic::Max),
            "AVG" => Ok(Statistic::Avg),
            "MIN" => Ok(Statistic::Min),
            other => Err(format!("Unknown statistic '{}'", other)),
        }
    }
}

/// Parse the comma separated `additionalInfo` field, skipping blanks and unknown items
pub fn parse_statistics(info: &str) -> Vec<Statistic> {
    info.split(',').filter_map(|item| item.parse().ok()).collect()
}

pub fn join_statistics(stats: &[Statistic]) -> String {
    stats.iter().map(Statistic::as_str).collect::<Vec<_>>().join(",")
}

/// Templates whose name contains `query`, ignoring case
pub fn filter_by_name<'a>(templates: &'a [Template], query: &str) -> Vec<&'a Template> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return templates.iter().collect();
    }
    templates
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&query))
        .collect()
}

/// Comma separated preview of the first two parameters
///
/// # Examples
/// ```
/// use report_console::template::short_parameters;
///
/// let params = vec!["A".to_string(), "B".to_string(), "C".to_string()];
/// assert_eq!(short_parameters(&params), "A, B, ...");
/// ```
pub fn short_parameters(parameters: &[String]) -> String {
    let mut preview = parameters.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
    if parameters.len() > 2 {
        preview.push_str(", ...");
    }
    preview
}

pub fn group_by_report_group(templates: &[Template]) -> BTreeMap<String, Vec<&Template>> {
    let mut groups: BTreeMap<String, Vec<&Template>> = BTreeMap::new();
    for template in templates {
        groups.entry(template.report_group.clone()).or_default().push(template);
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Name,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Column sort of the template table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl TemplateSort {
    /// Sort state after a click on the `key` column header
    ///
    /// Clicking the column that is currently sorted ascending flips it to
    /// descending; anything else starts ascending.
    pub fn request(current: Option<TemplateSort>, key: SortKey) -> TemplateSort {
        let direction = match current {
            Some(sort) if sort.key == key && sort.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        TemplateSort { key, direction }
    }

    pub fn apply(&self, templates: &mut [Template]) {
        templates.sort_by(|a, b| {
            let ord = match self.key {
                SortKey::Id => a.id.cmp(&b.id),
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Group => a.report_group.cmp(&b.report_group),
            };
            match self.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
}
