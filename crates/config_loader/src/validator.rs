//! Configuration validation
//!
//! Rules:
//! - field ranges declared on the config types (`validator` derive)
//! - excluded subject ids unique
//! - required marker labels non-empty, unique ignoring case
//! - data_folder non-empty when set

use std::collections::HashSet;

use contracts::{DatasetConfig, DatasetError};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a DatasetConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DatasetConfig) -> Result<(), DatasetError> {
    validate_declared_rules(config)?;
    validate_excluded_subjects(config)?;
    validate_required_markers(config)?;
    validate_data_folder(config)?;
    Ok(())
}

/// Run the derived rules and report the first violation with its dotted field path
fn validate_declared_rules(config: &DatasetConfig) -> Result<(), DatasetError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_violation(&errors, String::new())
                .unwrap_or_else(|| (String::from("<config>"), errors.to_string()));
            Err(DatasetError::config_validation(field, message))
        }
    }
}

fn first_violation(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by_key(|(field, _)| field.to_string());

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed '{}' check", e.code));
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_violation(inner, path.clone()),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(inner, format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Excluded subject ids are unique
fn validate_excluded_subjects(config: &DatasetConfig) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for subject in &config.excluded_subjects {
        if !seen.insert(subject.as_str()) {
            return Err(DatasetError::config_validation(
                format!("excluded_subjects[{subject}]"),
                "duplicate subject id",
            ));
        }
    }
    Ok(())
}

/// Marker labels are compared lower-cased, like C3D labels
fn validate_required_markers(config: &DatasetConfig) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for (idx, marker) in config.load.required_markers.iter().enumerate() {
        let label = marker.trim().to_lowercase();
        if label.is_empty() {
            return Err(DatasetError::config_validation(
                format!("load.required_markers[{idx}]"),
                "marker label cannot be empty",
            ));
        }
        if !seen.insert(label) {
            return Err(DatasetError::config_validation(
                format!("load.required_markers[{idx}]"),
                format!("duplicate marker label '{marker}'"),
            ));
        }
    }
    Ok(())
}

fn validate_data_folder(config: &DatasetConfig) -> Result<(), DatasetError> {
    if let Some(folder) = &config.data_folder {
        if folder.as_os_str().is_empty() {
            return Err(DatasetError::config_validation(
                "data_folder",
                "data_folder cannot be empty; omit it instead",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn field_of(err: DatasetError) -> String {
        match err {
            DatasetError::ConfigValidation { field, .. } => field,
            other => panic!("expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate(&DatasetConfig::default()).is_ok());
    }

    #[test]
    fn test_nested_field_path() {
        let mut config = DatasetConfig::default();
        config.load.trigger.min_high_samples = 0;
        let field = field_of(validate(&config).unwrap_err());
        assert_eq!(field, "load.trigger.min_high_samples");
    }

    #[test]
    fn test_duplicate_excluded_subject() {
        let config = DatasetConfig {
            excluded_subjects: vec!["6dbe".into(), "6dbe".into()],
            ..DatasetConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_blank_excluded_subject() {
        let config = DatasetConfig {
            excluded_subjects: vec!["  ".into()],
            ..DatasetConfig::default()
        };
        assert_eq!(field_of(validate(&config).unwrap_err()), "excluded_subjects");
    }

    #[test]
    fn test_required_markers_case_insensitive_duplicates() {
        let mut config = DatasetConfig::default();
        config.load.required_markers = vec!["L_TOE".into(), "l_toe".into()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate marker label"));
    }

    #[test]
    fn test_empty_data_folder() {
        let config = DatasetConfig {
            data_folder: Some(PathBuf::new()),
            ..DatasetConfig::default()
        };
        assert_eq!(field_of(validate(&config).unwrap_err()), "data_folder");
    }

    #[test]
    fn test_empty_expected_revision() {
        let config = DatasetConfig {
            expected_revision: Some(String::new()),
            ..DatasetConfig::default()
        };
        assert_eq!(field_of(validate(&config).unwrap_err()), "expected_revision");
    }
}
