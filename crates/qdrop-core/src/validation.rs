//! Artifact and form validation
//!
//! Pure checks run before any network call. Form validation collects every violation
//! so all problems can be shown at once.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::config::QDropConfig;
use crate::models::{ArtifactFile, BuildForm};

/// A form field that can be required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Version,
    Label,
    Changelog,
    Submitter,
}

impl FormField {
    /// Name shown to the user.
    pub fn display_name(self) -> &'static str {
        match self {
            FormField::Version => "Version",
            FormField::Label => "Label",
            FormField::Changelog => "Changelog",
            FormField::Submitter => "User",
        }
    }

    fn value(self, form: &BuildForm) -> &str {
        match self {
            FormField::Version => &form.version,
            FormField::Label => &form.label,
            FormField::Changelog => &form.changelog,
            FormField::Submitter => &form.submitter_name,
        }
    }
}

impl FromStr for FormField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "version" => Ok(FormField::Version),
            "label" => Ok(FormField::Label),
            "changelog" => Ok(FormField::Changelog),
            "submitter" | "user" | "name" => Ok(FormField::Submitter),
            _ => Err(anyhow::anyhow!("Unknown form field: {}", s)),
        }
    }
}

impl Display for FormField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.display_name())
    }
}

/// Validation failures for a submission
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Only {} files are allowed", .allowed.join(", "))]
    InvalidFileType {
        file_name: String,
        allowed: Vec<String>,
    },

    #[error("File size must be less than {}MB", .max / 1024 / 1024)]
    FileTooLarge { size: u64, max: u64 },

    #[error("{0} is required")]
    MissingField(FormField),

    #[error("Artifact file is required")]
    MissingFile,
}

/// Validates the selected artifact and the submit form.
#[derive(Debug, Clone)]
pub struct ArtifactValidator {
    allowed_extensions: Vec<String>,
    max_file_size: u64,
    required_fields: Vec<FormField>,
}

impl ArtifactValidator {
    /// `allowed_extensions` may be given with or without a leading dot.
    /// Version and label are always required; `extra_required` adds to them.
    pub fn new(
        allowed_extensions: Vec<String>,
        max_file_size: u64,
        extra_required: &[FormField],
    ) -> Self {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| normalize_extension(&ext))
            .filter(|ext| ext.len() > 1)
            .collect();

        let mut required_fields = vec![FormField::Version, FormField::Label];
        for field in extra_required {
            if !required_fields.contains(field) {
                required_fields.push(*field);
            }
        }

        Self {
            allowed_extensions,
            max_file_size,
            required_fields,
        }
    }

    pub fn from_config(config: &QDropConfig) -> Self {
        Self::new(
            config.allowed_extensions.clone(),
            config.max_file_size_bytes,
            &config.required_fields,
        )
    }

    pub fn required_fields(&self) -> &[FormField] {
        &self.required_fields
    }

    /// Check the file name's extension (case-insensitive), then its size.
    pub fn validate_artifact(&self, file: &ArtifactFile) -> Result<(), ValidationError> {
        let name = file.name.to_lowercase();
        if !self
            .allowed_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
        {
            return Err(ValidationError::InvalidFileType {
                file_name: file.name.clone(),
                allowed: self.allowed_extensions.clone(),
            });
        }

        if file.size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Report every required field that is blank after trimming, plus a missing or empty file.
    pub fn validate_form(
        &self,
        form: &BuildForm,
        file: Option<&ArtifactFile>,
    ) -> Result<(), Vec<ValidationError>> {
        let mut violations: Vec<ValidationError> = self
            .required_fields
            .iter()
            .filter(|field| field.value(form).trim().is_empty())
            .map(|field| ValidationError::MissingField(*field))
            .collect();

        if file.map_or(true, |f| f.size == 0) {
            violations.push(ValidationError::MissingFile);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Form and artifact checks together.
    pub fn validate(
        &self,
        form: &BuildForm,
        file: Option<&ArtifactFile>,
    ) -> Result<(), Vec<ValidationError>> {
        let mut violations = self.validate_form(form, file).err().unwrap_or_default();

        if let Some(file) = file.filter(|f| f.size > 0) {
            if let Err(e) = self.validate_artifact(file) {
                violations.push(e);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn test_validator() -> ArtifactValidator {
        ArtifactValidator::new(vec![".apk".to_string()], 100 * MB, &[FormField::Submitter])
    }

    fn sized(name: &str, size: u64) -> ArtifactFile {
        let mut file = ArtifactFile::from_bytes(name, vec![0u8; 1]);
        file.size = size;
        file
    }

    fn complete_form() -> BuildForm {
        BuildForm {
            version: "1.0".to_string(),
            label: "beta".to_string(),
            changelog: String::new(),
            submitter_name: "sam".to_string(),
        }
    }

    #[test]
    fn test_validate_artifact_ok() {
        let validator = test_validator();
        assert!(validator.validate_artifact(&sized("app-1.0.apk", 5 * MB)).is_ok());
        assert!(validator.validate_artifact(&sized("APP.APK", 1)).is_ok());
    }

    #[test]
    fn test_wrong_extension_wins_over_size() {
        let validator = test_validator();
        for size in [1, 5 * MB, 500 * MB] {
            assert!(matches!(
                validator.validate_artifact(&sized("app.zip", size)),
                Err(ValidationError::InvalidFileType { .. })
            ));
        }
        assert!(matches!(
            validator.validate_artifact(&sized("apk", 1)),
            Err(ValidationError::InvalidFileType { .. })
        ));
    }

    #[test]
    fn test_file_too_large() {
        let validator = test_validator();
        assert!(validator.validate_artifact(&sized("a.apk", 100 * MB)).is_ok());
        assert_eq!(
            validator.validate_artifact(&sized("a.apk", 100 * MB + 1)),
            Err(ValidationError::FileTooLarge {
                size: 100 * MB + 1,
                max: 100 * MB
            })
        );
    }

    #[test]
    fn test_extension_without_dot_is_normalized() {
        let validator = ArtifactValidator::new(vec!["AAB".to_string()], MB, &[]);
        assert!(validator.validate_artifact(&sized("bundle.aab", 10)).is_ok());
    }

    #[test]
    fn test_validate_form_ok() {
        let validator = test_validator();
        let file = sized("a.apk", 10);
        assert!(validator.validate_form(&complete_form(), Some(&file)).is_ok());
    }

    #[test]
    fn test_validate_form_reports_every_missing_field() {
        let validator = test_validator();
        let form = BuildForm {
            version: "   ".to_string(),
            ..Default::default()
        };

        let violations = validator.validate_form(&form, None).unwrap_err();
        assert_eq!(
            violations,
            vec![
                ValidationError::MissingField(FormField::Version),
                ValidationError::MissingField(FormField::Label),
                ValidationError::MissingField(FormField::Submitter),
                ValidationError::MissingFile,
            ]
        );
    }

    #[test]
    fn test_empty_file_counts_as_missing() {
        let validator = test_validator();
        let file = sized("a.apk", 0);
        assert_eq!(
            validator.validate_form(&complete_form(), Some(&file)),
            Err(vec![ValidationError::MissingFile])
        );
    }

    #[test]
    fn test_changelog_policy() {
        let validator = ArtifactValidator::new(vec![".apk".to_string()], MB, &[FormField::Changelog]);
        let file = sized("a.apk", 10);
        let form = BuildForm {
            submitter_name: String::new(),
            ..complete_form()
        };
        assert_eq!(
            validator.validate_form(&form, Some(&file)),
            Err(vec![ValidationError::MissingField(FormField::Changelog)])
        );
    }

    #[test]
    fn test_validate_combines_form_and_artifact() {
        let validator = test_validator();
        let form = BuildForm {
            label: String::new(),
            ..complete_form()
        };
        let file = sized("a.txt", 10);

        let violations = validator.validate(&form, Some(&file)).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0], ValidationError::MissingField(FormField::Label));
        assert!(matches!(violations[1], ValidationError::InvalidFileType { .. }));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::MissingField(FormField::Submitter).to_string(),
            "User is required"
        );
        assert_eq!(
            ValidationError::FileTooLarge { size: 0, max: 100 * MB }.to_string(),
            "File size must be less than 100MB"
        );
        assert_eq!(
            ValidationError::InvalidFileType {
                file_name: "a".to_string(),
                allowed: vec![".apk".to_string()]
            }
            .to_string(),
            "Only .apk files are allowed"
        );
    }

    #[test]
    fn test_parse_form_field() {
        assert_eq!("user".parse::<FormField>().unwrap(), FormField::Submitter);
        assert_eq!("Changelog".parse::<FormField>().unwrap(), FormField::Changelog);
        assert!("colour".parse::<FormField>().is_err());
    }
}
