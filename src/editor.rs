use crate::parameter::{Parameter, ParameterDraft, ParameterError};
use crate::template::{Statistic, Template, TemplatePayload, join_statistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Maximum number of parameters a new template may carry
pub const MAX_PARAMETERS: usize = 12;
/// Maximum length of a report name
pub const MAX_NAME_LEN: usize = 20;

pub const RANGE_ERROR: &str = "Start range must be less than end range";
pub const NEGATIVE_RANGE_ERROR: &str = "Range values cannot be negative";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Start range must be less than end range for all parameters")]
    InvalidRanges,

    #[error("You can select a maximum of 12 parameters.")]
    TooManyParameters,

    #[error("Parameter index {0} is out of bounds")]
    NoSuchParameter(usize),

    #[error("Group name cannot be empty.")]
    EmptyGroupName,

    #[error("Template form is invalid")]
    Invalid(FormErrors),

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Edit dialog state for an existing template
///
/// Holds one [`ParameterDraft`] per selected parameter so that ranges can be
/// half-typed while the dialog is open.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEditor {
    pub template_id: i64,
    pub name: String,
    pub report_group: String,
    pub statistics: Vec<Statistic>,
    pub drafts: Vec<ParameterDraft>,
}

impl TemplateEditor {
    pub fn open(template: &Template) -> Self {
        TemplateEditor {
            template_id: template.id,
            name: template.name.clone(),
            report_group: template.report_group.clone(),
            statistics: template.statistics(),
            drafts: template
                .parameters
                .iter()
                .map(|token| ParameterDraft::from_token(token))
                .collect(),
        }
    }

    /// Select or deselect a parameter by base name
    pub fn toggle_parameter(&mut self, name: &str, selected: bool) {
        if selected {
            self.drafts.push(ParameterDraft::new(name));
        } else {
            self.drafts.retain(|d| d.base_name != name);
        }
    }

    fn draft_mut(&mut self, index: usize) -> Result<&mut ParameterDraft, TemplateError> {
        self.drafts
            .get_mut(index)
            .ok_or(TemplateError::NoSuchParameter(index))
    }

    pub fn set_min(&mut self, index: usize, text: &str) -> Result<(), TemplateError> {
        self.draft_mut(index)?.set_min_text(text)?;
        Ok(())
    }

    pub fn set_max(&mut self, index: usize, text: &str) -> Result<(), TemplateError> {
        self.draft_mut(index)?.set_max_text(text)?;
        Ok(())
    }

    pub fn set_unit(&mut self, index: usize, unit: &str) -> Result<(), TemplateError> {
        self.draft_mut(index)?.unit = unit.to_string();
        Ok(())
    }

    pub fn validate_ranges(&self) -> bool {
        self.drafts.iter().all(ParameterDraft::validate_range)
    }

    /// Encode the dialog into an `editTemplate` body
    ///
    /// Parameters the user did not touch are saved with their stored token.
    ///
    /// # Returns
    /// * `Result<TemplatePayload, TemplateError>` - The payload, or
    ///   `InvalidRanges` when any draft has `min >= max`
    pub fn build_payload(&self) -> Result<TemplatePayload, TemplateError> {
        if !self.validate_ranges() {
            return Err(TemplateError::InvalidRanges);
        }

        let parameters = self
            .drafts
            .iter()
            .map(ParameterDraft::to_token)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TemplatePayload {
            name: self.name.clone(),
            report_group: self.report_group.clone(),
            parameters,
            additional_info: join_statistics(&self.statistics),
        })
    }
}

/// Optional range attached to a parameter in the creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeOption {
    #[serde(rename = "addRange", default)]
    pub add_range: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    #[serde(default)]
    pub unit: String,
}

impl Default for RangeOption {
    fn default() -> Self {
        RangeOption {
            add_range: false,
            min: Some(18),
            max: Some(25),
            unit: String::new(),
        }
    }
}

/// Per-field validation messages of the creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub ranges: BTreeMap<String, String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.report_name.is_none()
            && self.group_name.is_none()
            && self.parameters.is_none()
            && self.additional_info.is_none()
            && self.ranges.is_empty()
    }
}

/// New template form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateCreator {
    pub report_name: String,
    pub group_name: String,
    /// Selected catalog names in selection order
    pub selected: Vec<String>,
    #[serde(default)]
    pub ranges: BTreeMap<String, RangeOption>,
    #[serde(default)]
    pub statistics: Vec<Statistic>,
}

impl TemplateCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect a catalog parameter
    ///
    /// Selecting beyond [`MAX_PARAMETERS`] fails and leaves the form as is.
    pub fn select_parameter(&mut self, name: &str, checked: bool) -> Result<(), TemplateError> {
        if checked {
            if self.selected.iter().any(|p| p == name) {
                return Ok(());
            }
            if self.selected.len() >= MAX_PARAMETERS {
                return Err(TemplateError::TooManyParameters);
            }
            self.selected.push(name.to_string());
            self.ranges.insert(name.to_string(), RangeOption::default());
        } else {
            self.selected.retain(|p| p != name);
            self.ranges.remove(name);
        }
        Ok(())
    }

    pub fn toggle_statistic(&mut self, stat: Statistic, checked: bool) {
        if checked {
            if !self.statistics.contains(&stat) {
                self.statistics.push(stat);
            }
        } else {
            self.statistics.retain(|s| *s != stat);
        }
    }

    pub fn range_mut(&mut self, name: &str) -> Option<&mut RangeOption> {
        self.ranges.get_mut(name)
    }

    /// Check every field, collecting all messages at once
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.report_name.is_empty() {
            errors.report_name = Some("Report Name is required".to_string());
        } else if self.report_name.chars().count() > MAX_NAME_LEN {
            errors.report_name = Some(format!("Report Name cannot exceed {} characters", MAX_NAME_LEN));
        }

        if self.group_name.is_empty() {
            errors.group_name = Some("Group Name is required".to_string());
        }

        if self.selected.is_empty() {
            errors.parameters = Some("At least one parameter must be selected".to_string());
        } else if self.selected.len() > MAX_PARAMETERS {
            errors.parameters = Some(TemplateError::TooManyParameters.to_string());
        }

        if self.statistics.is_empty() {
            errors.additional_info = Some("At least one Additional Info must be selected".to_string());
        }

        for name in &self.selected {
            if let Some(range) = self.ranges.get(name) {
                if range.add_range {
                    let message = match (range.min, range.max) {
                        (Some(min), Some(max)) if min < 0 || max < 0 => Some(NEGATIVE_RANGE_ERROR),
                        (Some(min), Some(max)) if min < max => None,
                        _ => Some(RANGE_ERROR),
                    };
                    if let Some(message) = message {
                        errors.ranges.insert(name.clone(), message.to_string());
                    }
                }
            }
        }

        errors
    }

    /// Encode the form into a `createTemplate` body
    pub fn build_payload(&self) -> Result<TemplatePayload, TemplateError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(TemplateError::Invalid(errors));
        }

        let mut parameters = Vec::with_capacity(self.selected.len());
        for name in &self.selected {
            let parameter = match self.ranges.get(name) {
                Some(RangeOption {
                    add_range: true,
                    min: Some(min),
                    max: Some(max),
                    unit,
                }) => Parameter::ranged(name.clone(), *min, *max, unit.clone()),
                _ => Parameter::bare(name.clone()),
            };
            parameters.push(parameter.encode()?);
        }

        Ok(TemplatePayload {
            name: self.report_name.clone(),
            report_group: self.group_name.clone(),
            parameters,
            additional_info: join_statistics(&self.statistics),
        })
    }
}

/// Trim and check a group name before `add_group`
pub fn normalize_group_name(name: &str) -> Result<String, TemplateError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TemplateError::EmptyGroupName);
    }
    Ok(trimmed.to_string())
}
