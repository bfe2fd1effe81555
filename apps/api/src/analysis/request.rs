use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Target role title is required")]
pub struct MissingTargetRole;

/// Job-targeting metadata supplied alongside the CV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    target_role: String,
    candidate_name: Option<String>,
    notes: Option<String>,
}

impl RequestContext {
    /// The role title is the only required field; blank titles are rejected.
    pub fn new(target_role: impl Into<String>) -> Result<Self, MissingTargetRole> {
        let target_role = target_role.into().trim().to_string();
        if target_role.is_empty() {
            return Err(MissingTargetRole);
        }
        Ok(Self {
            target_role,
            candidate_name: None,
            notes: None,
        })
    }

    pub fn with_candidate_name(mut self, name: impl Into<String>) -> Self {
        self.candidate_name = non_blank(name.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(notes.into());
        self
    }

    pub fn target_role(&self) -> &str {
        &self.target_role
    }

    pub fn candidate_name(&self) -> Option<&str> {
        self.candidate_name.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
