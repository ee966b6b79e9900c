use std::collections::HashMap;
use std::fmt::Display;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::helper::library::{IdMatcher, MemberSelector};
use crate::helper::normalization::{DEFAULT_ALPHA_PRECISION, GroupSpec};

pub const MAX_ALPHA_PRECISION: usize = 32;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("Failed to parse param file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
    #[error("Param '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("No grouping defined, set either 'groups' or 'block_size'")]
    NoGrouping,
    #[error("Both 'groups' and 'block_size' are set, use only one")]
    ConflictingGrouping,
    #[error("'block_size' must be greater than 0")]
    ZeroBlockSize,
    #[error("{libraries} libraries cannot be split into blocks of {block_size}")]
    IncompleteBlock { libraries: usize, block_size: usize },
    #[error("Group name must not be empty")]
    EmptyGroupName,
    #[error("Duplicated group name: {0}")]
    DuplicatedGroup(String),
    #[error("Group '{0}' must set both 'start' and 'end', or neither")]
    MissingRangeBound(String),
    #[error("Group '{group}' has an empty row range {start}..{end}")]
    InvalidRange {
        group: String,
        start: usize,
        end: usize,
    },
    #[error("Group '{0}' sets both 'tag' and 'pattern'")]
    TagAndPattern(String),
    #[error("Group '{group}' has an invalid pattern: {source}")]
    InvalidPattern { group: String, source: regex::Error },
    #[error("Alpha precision {0} exceeds the maximum of 32 digits")]
    PrecisionTooLarge(usize),
}

/// Run configuration read from the JSON param file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Params {
    pub experimental_log: String,
    pub spike_in_log: String,
    #[serde(default = "default_output_table")]
    pub output_table: String,

    #[serde(default = "default_experimental_genome")]
    pub experimental_genome: String,
    #[serde(default = "default_spike_in_genome")]
    pub spike_in_genome: String,

    #[serde(
        default,
        deserialize_with = "string_or_number_to_option_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_libraries: Option<usize>,

    #[serde(default = "default_reference_marker")]
    pub reference_marker: String,

    #[serde(
        default = "default_precision",
        deserialize_with = "string_or_number_to_usize"
    )]
    pub precision: usize,

    #[serde(default)]
    pub strict_names: bool,

    #[serde(
        default,
        deserialize_with = "string_or_number_to_option_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub block_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupParams>,
}

/// One normalization group. Membership is the intersection of the row block
/// (`start..end`, 0-based, end exclusive) and the `tag`/`pattern` match.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupParams {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "string_or_number_to_option_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<usize>,
    #[serde(
        default,
        deserialize_with = "string_or_number_to_option_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Substring marking the group's input library, defaults to `reference_marker`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Grouping {
    Explicit(Vec<GroupSpec>),
    Blocks { size: usize, reference: String },
}

#[derive(Debug, Clone)]
pub struct ValidatedParams {
    pub experimental_log: String,
    pub spike_in_log: String,
    pub output_table: String,
    pub experimental_genome: String,
    pub spike_in_genome: String,
    pub expected_libraries: Option<usize>,
    pub precision: usize,
    pub strict_names: bool,
    pub grouping: Grouping,
}

impl ValidatedParams {
    /// Resolves the grouping for a table of `libraries` rows.
    pub fn group_specs(&self, libraries: usize) -> Result<Vec<GroupSpec>, ParamsError> {
        match &self.grouping {
            Grouping::Explicit(groups) => Ok(groups.clone()),
            Grouping::Blocks { size, reference } => {
                if libraries % size != 0 {
                    return Err(ParamsError::IncompleteBlock {
                        libraries,
                        block_size: *size,
                    });
                }
                Ok((0..libraries / size)
                    .map(|i| GroupSpec {
                        name: format!("block_{}", i + 1),
                        members: MemberSelector {
                            rows: Some((i * size, (i + 1) * size)),
                            id: None,
                        },
                        reference: IdMatcher::Contains(reference.clone()),
                    })
                    .collect())
            }
        }
    }
}

pub static PRESETS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("rep4", include_str!("../../resources/presets/rep4.json"));
    m.insert("blocks4", include_str!("../../resources/presets/blocks4.json"));
    m
});

pub fn preset_names() -> Vec<&'static str> {
    PRESETS.keys().copied().sorted().collect()
}

fn default_output_table() -> String {
    "normalization_table.csv".to_string()
}

fn default_experimental_genome() -> String {
    "S. cerevisiae".to_string()
}

fn default_spike_in_genome() -> String {
    "S. pombe".to_string()
}

fn default_reference_marker() -> String {
    "input".to_string()
}

fn default_precision() -> usize {
    DEFAULT_ALPHA_PRECISION
}

impl Params {
    pub fn from_json_string(json_str: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn from_preset(name: &str) -> Result<Self, ParamsError> {
        let json = PRESETS
            .get(name)
            .ok_or_else(|| ParamsError::UnknownPreset(name.to_string()))?;
        Self::from_json_string(json)
    }

    pub fn to_json_string(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<ValidatedParams, ParamsError> {
        for (field, value) in [
            ("experimental_log", &self.experimental_log),
            ("spike_in_log", &self.spike_in_log),
            ("output_table", &self.output_table),
            ("reference_marker", &self.reference_marker),
        ] {
            if value.trim().is_empty() {
                return Err(ParamsError::EmptyField(field));
            }
        }

        if self.precision > MAX_ALPHA_PRECISION {
            return Err(ParamsError::PrecisionTooLarge(self.precision));
        }

        let grouping = match (self.groups.is_empty(), self.block_size) {
            (true, None) => return Err(ParamsError::NoGrouping),
            (false, Some(_)) => return Err(ParamsError::ConflictingGrouping),
            (true, Some(0)) => return Err(ParamsError::ZeroBlockSize),
            (true, Some(size)) => Grouping::Blocks {
                size,
                reference: self.reference_marker.clone(),
            },
            (false, None) => Grouping::Explicit(
                self.groups
                    .iter()
                    .map(|g| g.validate(&self.reference_marker))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        if let Some(name) = self.groups.iter().map(|g| &g.name).duplicates().next() {
            return Err(ParamsError::DuplicatedGroup(name.to_string()));
        }

        Ok(ValidatedParams {
            experimental_log: self.experimental_log.clone(),
            spike_in_log: self.spike_in_log.clone(),
            output_table: self.output_table.clone(),
            experimental_genome: self.experimental_genome.clone(),
            spike_in_genome: self.spike_in_genome.clone(),
            expected_libraries: self.expected_libraries,
            precision: self.precision,
            strict_names: self.strict_names,
            grouping,
        })
    }
}

impl GroupParams {
    pub fn validate(&self, default_reference: &str) -> Result<GroupSpec, ParamsError> {
        if self.name.trim().is_empty() {
            return Err(ParamsError::EmptyGroupName);
        }

        let rows = match (self.start, self.end) {
            (Some(start), Some(end)) if start >= end => {
                return Err(ParamsError::InvalidRange {
                    group: self.name.clone(),
                    start,
                    end,
                });
            }
            (Some(start), Some(end)) => Some((start, end)),
            (None, None) => None,
            _ => return Err(ParamsError::MissingRangeBound(self.name.clone())),
        };

        let id = match (&self.tag, &self.pattern) {
            (Some(_), Some(_)) => return Err(ParamsError::TagAndPattern(self.name.clone())),
            (Some(tag), None) => Some(IdMatcher::Contains(tag.clone())),
            (None, Some(pattern)) => Some(IdMatcher::Pattern(Regex::new(pattern).map_err(
                |source| ParamsError::InvalidPattern {
                    group: self.name.clone(),
                    source,
                },
            )?)),
            (None, None) => None,
        };

        let reference = self
            .reference
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(default_reference);

        Ok(GroupSpec {
            name: self.name.clone(),
            members: MemberSelector { rows, id },
            reference: IdMatcher::Contains(reference.to_string()),
        })
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{\n")?;
        write!(f, "  experimental_log: {},\n", self.experimental_log)?;
        write!(f, "  spike_in_log: {},\n", self.spike_in_log)?;
        write!(f, "  output_table: {},\n", self.output_table)?;
        write!(
            f,
            "  genomes: {} / {},\n",
            self.experimental_genome, self.spike_in_genome
        )?;
        if let Some(n) = self.expected_libraries {
            write!(f, "  expected_libraries: {},\n", n)?;
        }
        write!(f, "  reference_marker: {},\n", self.reference_marker)?;
        write!(f, "  precision: {},\n", self.precision)?;
        if let Some(size) = self.block_size {
            write!(f, "  block_size: {},\n", size)?;
        }
        if !self.groups.is_empty() {
            write!(f, "  groups: [\n")?;
            for group in &self.groups {
                write!(f, "    {},\n", group)?;
            }
            write!(f, "  ]\n")?;
        }
        write!(f, "}}")
    }
}

impl Display for GroupParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ name: {}", self.name)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            write!(f, ", rows: {}..{}", start, end)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, ", tag: {}", tag)?;
        }
        if let Some(pattern) = &self.pattern {
            write!(f, ", pattern: {}", pattern)?;
        }
        if let Some(reference) = &self.reference {
            write!(f, ", reference: {}", reference)?;
        }
        write!(f, " }}")
    }
}

fn string_or_number_to_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match string_or_number_to_option_usize(deserializer)? {
        Some(n) => Ok(n),
        None => Err(Error::custom("expected an integer")),
    }
}

fn string_or_number_to_option_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match val {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(num) => num
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| Error::custom(format!("Invalid non-negative integer: {}", num))),
        serde_json::Value::String(s) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim()
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|_| Error::custom(format!("Invalid integer string: {}", s)))
            }
        }
        other => Err(Error::custom(format!("Expected an integer, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_json_file() {
        let path = "tests/data/params_rep4.json";
        let params = Params::from_json_string(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(params.experimental_log, "rep4_counts.log");
        assert_eq!(params.expected_libraries, Some(16));
        assert_eq!(params.precision, 16);
        assert_eq!(params.groups.len(), 4);
        assert_eq!(params.groups[1].start, Some(4));

        let validated = params.validate().unwrap();
        let specs = validated.group_specs(16).unwrap();
        assert_eq!(specs.len(), 4);
        assert!(specs[0].members.is_member(2, "rep4_93_D_input"));
        assert!(!specs[0].members.is_member(5, "rep4_93_I_input"));
    }

    #[test]
    fn test_defaults_and_string_numbers() {
        let json = r#"{
            "experimental_log": "exp.log",
            "spike_in_log": "spike.log",
            "block_size": "4",
            "expected_libraries": ""
        }"#;
        let params = Params::from_json_string(json).unwrap();
        assert_eq!(params.output_table, "normalization_table.csv");
        assert_eq!(params.reference_marker, "input");
        assert_eq!(params.precision, DEFAULT_ALPHA_PRECISION);
        assert_eq!(params.block_size, Some(4));
        assert_eq!(params.expected_libraries, None);
        assert!(!params.strict_names);
    }

    #[test]
    fn test_invalid_number_string() {
        let json = r#"{ "experimental_log": "a", "spike_in_log": "b", "block_size": "four" }"#;
        assert!(matches!(
            Params::from_json_string(json),
            Err(ParamsError::Json(_))
        ));
    }

    #[test]
    fn test_block_grouping() {
        let params = Params::from_preset("blocks4").unwrap();
        let validated = params.validate().unwrap();

        let specs = validated.group_specs(8).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].name, "block_2");
        assert_eq!(specs[1].members.rows, Some((4, 8)));

        assert!(matches!(
            validated.group_specs(10),
            Err(ParamsError::IncompleteBlock {
                libraries: 10,
                block_size: 4
            })
        ));
    }

    #[test]
    fn test_presets() {
        assert_eq!(preset_names(), vec!["blocks4", "rep4"]);
        for name in preset_names() {
            let params = Params::from_preset(name).unwrap();
            assert!(params.validate().is_ok());
        }
        assert!(matches!(
            Params::from_preset("v9"),
            Err(ParamsError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_validation_errors() {
        let mut params = Params::from_preset("rep4").unwrap();

        params.block_size = Some(4);
        assert!(matches!(
            params.validate(),
            Err(ParamsError::ConflictingGrouping)
        ));

        params.block_size = None;
        params.groups.clear();
        assert!(matches!(params.validate(), Err(ParamsError::NoGrouping)));

        params.block_size = Some(0);
        assert!(matches!(params.validate(), Err(ParamsError::ZeroBlockSize)));

        let mut params = Params::from_preset("rep4").unwrap();
        params.groups[1].name = "93_D".to_string();
        assert!(matches!(
            params.validate(),
            Err(ParamsError::DuplicatedGroup(name)) if name == "93_D"
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.groups[0].end = Some(0);
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidRange { start: 0, end: 0, .. })
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.groups[0].end = None;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::MissingRangeBound(_))
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.groups[0].pattern = Some("93_D$".to_string());
        assert!(matches!(
            params.validate(),
            Err(ParamsError::TagAndPattern(_))
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.groups[0].tag = None;
        params.groups[0].pattern = Some("([".to_string());
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidPattern { .. })
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.precision = 40;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::PrecisionTooLarge(40))
        ));

        let mut params = Params::from_preset("rep4").unwrap();
        params.spike_in_log = " ".to_string();
        assert!(matches!(
            params.validate(),
            Err(ParamsError::EmptyField("spike_in_log"))
        ));
    }

    #[test]
    fn test_group_reference_override() {
        let group = GroupParams {
            name: "ctrl".to_string(),
            start: None,
            end: None,
            tag: None,
            pattern: Some(r"^rep\d_ctrl_".to_string()),
            reference: Some("mock".to_string()),
        };
        let spec = group.validate("input").unwrap();
        assert!(spec.reference.is_match("rep1_ctrl_mock"));
        assert!(!spec.reference.is_match("rep1_ctrl_input"));
    }

    #[test]
    fn test_json_round_trip_skips_empty_fields() {
        let params = Params::from_preset("blocks4").unwrap();
        let json = params.to_json_string().unwrap();
        assert!(!json.contains("groups"));
        assert!(!json.contains("expected_libraries"));
        let again = Params::from_json_string(&json).unwrap();
        assert_eq!(again.block_size, Some(4));
    }
}
