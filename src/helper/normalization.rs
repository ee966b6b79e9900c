use getset::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helper::library::{IdMatcher, LibraryRecord, LibraryTable, MemberSelector};

pub const DEFAULT_ALPHA_PRECISION: usize = 16;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("Library table is empty")]
    EmptyTable,
    #[error("No normalization groups defined")]
    NoGroups,
    #[error("Library '{0}' does not belong to any normalization group")]
    UnassignedLibrary(String),
    #[error("Library '{library}' matches more than one normalization group: {groups:?}")]
    AmbiguousGroup {
        library: String,
        groups: Vec<String>,
    },
    #[error("Normalization group '{0}' has no member libraries")]
    EmptyGroup(String),
    #[error("No reference library ({matcher}) found in group '{group}'")]
    MissingReference { group: String, matcher: String },
    #[error("Group '{group}' has more than one reference library: {libraries:?}")]
    AmbiguousReference {
        group: String,
        libraries: Vec<String>,
    },
    #[error("Spike-in read count is zero for library '{0}'")]
    ZeroSpikeIn(String),
    #[error("Experimental read count is zero for reference library '{0}'")]
    ZeroExperimental(String),
    #[error("Total read count is zero for library '{0}'")]
    ZeroTotal(String),
}

/// A resolved normalization group. Members share the reference library's
/// experimental/spike-in ratio.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub name: String,
    pub members: MemberSelector,
    pub reference: IdMatcher,
}

#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[getset(get = "pub")]
    library: String,
    #[getset(get = "pub")]
    group: String,
    #[getset(get = "pub")]
    experimental_count: u64,
    #[getset(get = "pub")]
    spike_in_count: u64,
    #[getset(get = "pub")]
    total_count: u64,
    #[getset(get = "pub")]
    proportion_spike: f64,
    #[getset(get = "pub")]
    proportion_experimental: f64,
    #[getset(get = "pub")]
    alpha: f64,
    #[getset(get = "pub")]
    alpha_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct GroupNorm {
    #[getset(get = "pub")]
    group: String,
    #[getset(get = "pub")]
    reference: String,
    #[getset(get = "pub")]
    group_norm: f64,
    #[getset(get = "pub")]
    members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct NormalizedTable {
    #[getset(get = "pub")]
    records: Vec<NormalizedRecord>,
    #[getset(get = "pub")]
    groups: Vec<GroupNorm>,
}

/// Read proportions of a single library: (total, proportion_spike, proportion_experimental).
pub fn read_proportions(record: &LibraryRecord) -> Result<(u64, f64, f64), NormalizationError> {
    let total = record.experimental_count() + record.spike_in_count();
    if total == 0 {
        return Err(NormalizationError::ZeroTotal(record.library().to_owned()));
    }
    let proportion_spike = *record.spike_in_count() as f64 / total as f64;
    let proportion_experimental = *record.experimental_count() as f64 / total as f64;
    Ok((total, proportion_spike, proportion_experimental))
}

/// experimental / spike-in ratio of the group's input library.
pub fn group_norm(reference: &LibraryRecord) -> Result<f64, NormalizationError> {
    if *reference.spike_in_count() == 0 {
        return Err(NormalizationError::ZeroSpikeIn(
            reference.library().to_owned(),
        ));
    }
    if *reference.experimental_count() == 0 {
        return Err(NormalizationError::ZeroExperimental(
            reference.library().to_owned(),
        ));
    }
    Ok(*reference.experimental_count() as f64 / *reference.spike_in_count() as f64)
}

/// alpha = 1 / (spike_in_count * group_norm)
pub fn alpha(record: &LibraryRecord, group_norm: f64) -> Result<f64, NormalizationError> {
    if *record.spike_in_count() == 0 {
        return Err(NormalizationError::ZeroSpikeIn(record.library().to_owned()));
    }
    Ok(1.0 / (*record.spike_in_count() as f64 * group_norm))
}

/// Fixed-point rendering of alpha, never in scientific notation.
pub fn format_alpha(alpha: f64, precision: usize) -> String {
    format!("{:.*}", precision, alpha)
}

/// Returns, for every row of the table, the index of the one group it belongs to.
pub fn assign_groups(
    table: &LibraryTable,
    groups: &[GroupSpec],
) -> Result<Vec<usize>, NormalizationError> {
    let mut assignment = Vec::with_capacity(table.len());

    for (row, record) in table.iter().enumerate() {
        let matched: Vec<usize> = groups
            .iter()
            .positions(|g| g.members.is_member(row, record.library()))
            .collect();

        match matched.as_slice() {
            [] => {
                return Err(NormalizationError::UnassignedLibrary(
                    record.library().to_owned(),
                ));
            }
            [index] => assignment.push(*index),
            _ => {
                return Err(NormalizationError::AmbiguousGroup {
                    library: record.library().to_owned(),
                    groups: matched.iter().map(|&i| groups[i].name.clone()).collect(),
                });
            }
        }
    }

    Ok(assignment)
}

/// Computes read proportions and spike-in alpha factors for every library.
///
/// Each library must belong to exactly one group, and each group must hold
/// exactly one reference library. The returned records keep the input order.
pub fn normalize(
    table: &LibraryTable,
    groups: &[GroupSpec],
    precision: usize,
) -> Result<NormalizedTable, NormalizationError> {
    if table.is_empty() {
        return Err(NormalizationError::EmptyTable);
    }
    if groups.is_empty() {
        return Err(NormalizationError::NoGroups);
    }

    let assignment = assign_groups(table, groups)?;
    let records = table.records();

    let mut group_norms: Vec<GroupNorm> = Vec::with_capacity(groups.len());

    for (index, group) in groups.iter().enumerate() {
        let members: Vec<&LibraryRecord> = assignment
            .iter()
            .zip(records)
            .filter(|(g, _)| **g == index)
            .map(|(_, r)| r)
            .collect();

        if members.is_empty() {
            return Err(NormalizationError::EmptyGroup(group.name.clone()));
        }

        let references: Vec<&LibraryRecord> = members
            .iter()
            .copied()
            .filter(|r| group.reference.is_match(r.library()))
            .collect();

        let reference = match references.as_slice() {
            [] => {
                return Err(NormalizationError::MissingReference {
                    group: group.name.clone(),
                    matcher: group.reference.to_string(),
                });
            }
            [reference] => *reference,
            _ => {
                return Err(NormalizationError::AmbiguousReference {
                    group: group.name.clone(),
                    libraries: references.iter().map(|r| r.library().to_owned()).collect(),
                });
            }
        };

        group_norms.push(GroupNorm {
            group: group.name.clone(),
            reference: reference.library().to_owned(),
            group_norm: group_norm(reference)?,
            members: members.iter().map(|r| r.library().to_owned()).collect(),
        });
    }

    let mut normalized = Vec::with_capacity(records.len());

    for (record, &index) in records.iter().zip(&assignment) {
        let (total_count, proportion_spike, proportion_experimental) = read_proportions(record)?;
        let norm = &group_norms[index];
        let alpha = alpha(record, norm.group_norm)?;

        normalized.push(NormalizedRecord {
            library: record.library().to_owned(),
            group: norm.group.clone(),
            experimental_count: *record.experimental_count(),
            spike_in_count: *record.spike_in_count(),
            total_count,
            proportion_spike,
            proportion_experimental,
            alpha,
            alpha_formatted: format_alpha(alpha, precision),
        });
    }

    Ok(NormalizedTable {
        records: normalized,
        groups: group_norms,
    })
}
