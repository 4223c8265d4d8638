use super::{ArtifactFile, BuildForm};

/// Everything a caller supplies for one submit.
///
/// Replaces page-global state: the organization, form values and the selected file
/// travel together into `UploadOrchestrator::submit`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub organization_id: Option<String>,
    pub form: BuildForm,
    pub file: Option<ArtifactFile>,
    /// Overwrite the most recent record sharing the form's label instead of creating one.
    pub replace_previous: bool,
}

impl Session {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(organization_id.into()),
            ..Default::default()
        }
    }

    pub fn with_form(mut self, form: BuildForm) -> Self {
        self.form = form;
        self
    }

    pub fn with_file(mut self, file: ArtifactFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn replacing_previous(mut self, replace: bool) -> Self {
        self.replace_previous = replace;
        self
    }

    /// Trimmed organization identifier, `None` when absent or blank.
    pub fn organization(&self) -> Option<&str> {
        self.organization_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
