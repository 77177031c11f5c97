//! Column role resolution: which column is the identifier, and where the
//! target comes from.
//!
//! Target resolution is attempted in decreasing order of confidence and the
//! first success wins:
//!
//! 1. an external label source, when one was found next to the table
//! 2. a column carrying a canonical target name
//! 3. exactly one plausible binary column among the non-feature columns
//! 4. otherwise no target; the table is treated as features only

use std::collections::BTreeSet;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::labels::LabelSource;
use super::model::{Table, Value};
use crate::error::Diagnostic;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Naming conventions and thresholds driving resolution.
///
/// The defaults follow the AMEX default-prediction layout: `customer_ID`
/// records and feature groups prefixed `D_` (delinquency), `S_` (spend),
/// `P_` (payment), `B_` (balance) and `R_` (risk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Identifier column names, in priority order.
    pub identifier_names: Vec<String>,
    /// Target column names, in priority order.
    pub target_names: Vec<String>,
    /// Prefixes marking a column as a model input.
    pub feature_prefixes: Vec<String>,
    /// Closed bounds on the minority-class proportion of a heuristic target.
    pub min_minority: f64,
    pub max_minority: f64,
}

impl Default for RoleConfig {
    fn default() -> Self {
        fn strings(xs: &[&str]) -> Vec<String> {
            xs.iter().map(|s| s.to_string()).collect()
        }
        Self {
            identifier_names: strings(&["customer_ID", "id", "customer_id"]),
            target_names: strings(&["target", "default", "label", "y"]),
            feature_prefixes: strings(&["D_", "S_", "P_", "B_", "R_"]),
            min_minority: 0.01,
            max_minority: 0.5,
        }
    }
}

impl RoleConfig {
    pub fn is_feature_group(&self, column: &str) -> bool {
        self.feature_prefixes.iter().any(|p| column.starts_with(p.as_str()))
    }

    /// First configured identifier name present among `columns`.
    /// Feature-group columns never qualify.
    pub fn find_identifier<'a>(&self, columns: &'a [String]) -> Option<&'a String> {
        self.find_named(&self.identifier_names, columns)
    }

    /// First configured target name present among `columns`.
    /// Feature-group columns never qualify.
    pub fn find_target<'a>(&self, columns: &'a [String]) -> Option<&'a String> {
        self.find_named(&self.target_names, columns)
    }

    fn find_named<'a>(&self, names: &[String], columns: &'a [String]) -> Option<&'a String> {
        names
            .iter()
            .filter(|name| !self.is_feature_group(name))
            .find_map(|name| columns.iter().find(|c| *c == name))
    }
}

// ---------------------------------------------------------------------------
// Roles & outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identifier,
    Target,
    Feature,
}

/// Where the target lives, if anywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    Inline(String),
    External(PathBuf),
    Absent,
}

/// Outcome of role resolution for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: ResolvedTarget,
    pub identifier: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// Role of every column of `table`, in column order.
    pub fn roles(&self, table: &Table) -> Vec<(String, ColumnRole)> {
        table
            .columns
            .iter()
            .map(|c| {
                let role = if self.identifier.as_deref() == Some(c.as_str()) {
                    ColumnRole::Identifier
                } else if matches!(&self.target, ResolvedTarget::Inline(t) if t == c) {
                    ColumnRole::Target
                } else {
                    ColumnRole::Feature
                };
                (c.clone(), role)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Column statistics
// ---------------------------------------------------------------------------

/// What the binary-column heuristic needs to know about a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    /// Distinct values, nulls included.
    pub distinct: BTreeSet<Value>,
    /// Rows holding the rarer of exactly two classes, over all rows.
    /// `None` unless the column has exactly two non-null classes.
    pub minority_proportion: Option<f64>,
}

impl ColumnProfile {
    pub fn from_table(table: &Table, name: &str) -> Option<Self> {
        let distinct = table.distinct(name)?;
        let column = table.column(name)?;
        let counts = column.value_counts();

        let minority_proportion = if counts.len() == 2 && !table.is_empty() {
            counts
                .values()
                .min()
                .map(|&m| m as f64 / table.len() as f64)
        } else {
            None
        };

        Some(ColumnProfile {
            name: name.to_string(),
            distinct,
            minority_proportion,
        })
    }

    /// At most two distinct values, all drawn from {0, 1, -1}.
    pub fn is_near_binary(&self) -> bool {
        self.distinct.len() <= 2 && self.distinct.iter().all(Value::is_label_like)
    }
}

/// Profiles for every column not already ruled out by name.
pub fn profile_columns(
    table: &Table,
    config: &RoleConfig,
    identifier: Option<&str>,
) -> Vec<ColumnProfile> {
    table
        .columns
        .iter()
        .filter(|c| Some(c.as_str()) != identifier && !config.is_feature_group(c))
        .filter_map(|c| ColumnProfile::from_table(table, c))
        .collect()
}

/// Pure decision over column statistics: every profile that passes the
/// binary-target test, in input order.
pub fn binary_candidates<'a>(
    profiles: &'a [ColumnProfile],
    config: &RoleConfig,
) -> Vec<&'a str> {
    profiles
        .iter()
        .filter(|p| p.is_near_binary())
        .filter(|p| {
            matches!(p.minority_proportion,
                Some(m) if m >= config.min_minority && m <= config.max_minority)
        })
        .map(|p| p.name.as_str())
        .collect()
}

/// Assign a role to each profiled column.  The single surviving binary
/// candidate becomes the target; with zero or several, nothing does.
pub fn classify(
    profiles: &[ColumnProfile],
    config: &RoleConfig,
    identifier: Option<&str>,
) -> Vec<(String, ColumnRole)> {
    let candidates: Vec<&str> = binary_candidates(profiles, config)
        .into_iter()
        .filter(|c| Some(*c) != identifier && !config.is_feature_group(c))
        .collect();
    let target = match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    };

    profiles
        .iter()
        .map(|p| {
            let role = if Some(p.name.as_str()) == identifier {
                ColumnRole::Identifier
            } else if Some(p.name.as_str()) == target {
                ColumnRole::Target
            } else {
                ColumnRole::Feature
            };
            (p.name.clone(), role)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Decide the identifier column and the target source for `table`.
pub fn resolve(table: &Table, external: Option<&LabelSource>, config: &RoleConfig) -> Resolution {
    let identifier = config.find_identifier(&table.columns).cloned();
    match &identifier {
        Some(id) => debug!("identifier column: '{id}'"),
        None => debug!("no identifier column"),
    }

    let mut diagnostics = Vec::new();
    let target = if let Some(source) = external {
        info!("target found in separate file: {}", source.path.display());
        ResolvedTarget::External(source.path.clone())
    } else if let Some(name) = config.find_target(&table.columns) {
        info!("target column identified by name: '{name}'");
        ResolvedTarget::Inline(name.clone())
    } else {
        let profiles = profile_columns(table, config, identifier.as_deref());
        let roles = classify(&profiles, config, identifier.as_deref());
        match roles.into_iter().find(|(_, role)| *role == ColumnRole::Target) {
            Some((name, _)) => {
                info!("target column identified from values: '{name}'");
                ResolvedTarget::Inline(name)
            }
            None => {
                let candidates = binary_candidates(&profiles, config)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                diagnostics.push(Diagnostic::AmbiguousTarget { candidates }.raise());
                ResolvedTarget::Absent
            }
        }
    };

    Resolution {
        target,
        identifier,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    fn ten_rows(columns: &[&str], f: impl Fn(usize) -> Vec<Value>) -> Table {
        table(columns, (0..10).map(f).collect())
    }

    fn profile(name: &str, values: &[Value], minority: Option<f64>) -> ColumnProfile {
        ColumnProfile {
            name: name.into(),
            distinct: values.iter().cloned().collect(),
            minority_proportion: minority,
        }
    }

    #[test]
    fn identifier_follows_configured_priority() {
        let t = table(&["customer_id", "id", "D_1"], vec![]);
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.identifier.as_deref(), Some("id"));
    }

    #[test]
    fn canonical_target_name_wins_in_list_order() {
        let t = table(&["label", "D_1", "default"], vec![]);
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.target, ResolvedTarget::Inline("default".into()));
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn single_binary_column_is_selected() {
        let t = ten_rows(&["id", "D_1", "outcome"], |i| {
            vec![int(i as i64), int((i % 2) as i64), int((i < 2) as i64)]
        });
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.target, ResolvedTarget::Inline("outcome".into()));
    }

    #[test]
    fn two_binary_columns_resolve_to_absent() {
        let t = ten_rows(&["id", "flag_a", "flag_b"], |i| {
            vec![int(i as i64), int((i < 2) as i64), Value::Float((i > 6) as i64 as f64)]
        });
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.target, ResolvedTarget::Absent);
        assert_eq!(
            r.diagnostics,
            vec![Diagnostic::AmbiguousTarget {
                candidates: vec!["flag_a".into(), "flag_b".into()]
            }]
        );
    }

    #[test]
    fn feature_group_and_identifier_columns_are_never_candidates() {
        // `id` and `B_30` are binary with a plausible split but excluded by name.
        let t = ten_rows(&["id", "B_30"], |i| vec![int((i < 3) as i64), int((i < 3) as i64)]);
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.identifier.as_deref(), Some("id"));
        assert_eq!(r.target, ResolvedTarget::Absent);
    }

    #[test]
    fn constant_and_null_columns_are_rejected() {
        let t = ten_rows(&["constant", "with_null"], |i| {
            vec![int(1), if i == 0 { Value::Null } else { int((i < 4) as i64) }]
        });
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(r.target, ResolvedTarget::Absent);
    }

    #[test]
    fn minority_bounds_are_inclusive() {
        let config = RoleConfig::default();
        let zero_one = [int(0), int(1)];
        let profiles = vec![
            profile("half", &zero_one, Some(0.5)),
            profile("one_pct", &zero_one, Some(0.01)),
            profile("too_rare", &zero_one, Some(0.009)),
        ];
        assert_eq!(binary_candidates(&profiles, &config), vec!["half", "one_pct"]);
    }

    #[test]
    fn sentinel_counts_as_label_value() {
        let config = RoleConfig::default();
        let profiles = vec![
            profile("sentinel", &[Value::Float(-1.0), Value::Float(1.0)], Some(0.3)),
            profile("wide", &[int(0), int(2)], Some(0.3)),
        ];
        assert_eq!(binary_candidates(&profiles, &config), vec!["sentinel"]);
    }

    #[test]
    fn classify_marks_unique_candidate_as_target() {
        let config = RoleConfig::default();
        let zero_one = [int(0), int(1)];
        let profiles = vec![
            profile("customer_ID", &[Value::String("a".into())], None),
            profile("outcome", &zero_one, Some(0.2)),
            profile("amount", &[Value::Float(3.5)], None),
        ];
        let roles = classify(&profiles, &config, Some("customer_ID"));
        assert_eq!(
            roles,
            vec![
                ("customer_ID".to_string(), ColumnRole::Identifier),
                ("outcome".to_string(), ColumnRole::Target),
                ("amount".to_string(), ColumnRole::Feature),
            ]
        );

        let mut twice = profiles.clone();
        twice.push(profile("outcome_2", &zero_one, Some(0.4)));
        assert!(classify(&twice, &config, None)
            .iter()
            .all(|(_, role)| *role != ColumnRole::Target));
    }

    #[test]
    fn resolution_roles_cover_every_column() {
        let t = table(&["id", "D_1", "target"], vec![]);
        let r = resolve(&t, None, &RoleConfig::default());
        assert_eq!(
            r.roles(&t),
            vec![
                ("id".to_string(), ColumnRole::Identifier),
                ("D_1".to_string(), ColumnRole::Feature),
                ("target".to_string(), ColumnRole::Target),
            ]
        );
    }

    #[test]
    fn feature_group_names_are_never_identifier_or_target() {
        let config = RoleConfig {
            identifier_names: vec!["B_1".into(), "id".into()],
            target_names: vec!["D_44".into()],
            ..RoleConfig::default()
        };
        let t = table(&["B_1", "D_44", "id"], vec![]);
        let r = resolve(&t, None, &config);
        assert_eq!(r.identifier.as_deref(), Some("id"));
        assert_eq!(r.target, ResolvedTarget::Absent);
    }

    #[test]
    fn config_deserializes_with_partial_overrides() {
        let config: RoleConfig =
            serde_json::from_str(r#"{ "target_names": ["is_default"] }"#).unwrap();
        assert_eq!(config.target_names, vec!["is_default"]);
        assert_eq!(config.identifier_names, RoleConfig::default().identifier_names);
    }
}
