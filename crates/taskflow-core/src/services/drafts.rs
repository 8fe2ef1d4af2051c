//! Editable field sets accepted by `WorkspaceService`.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{Priority, ProjectStatus, TaskStatus};

/// Fields of a job form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDraft {
    pub name: String,
    pub description: String,
    pub notes: String,
}

impl JobDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Fields of a project form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub notes: String,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Fields of a task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub notes: String,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Fields of a note form. Attachments are managed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A single project field edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectField {
    Title(String),
    Status(ProjectStatus),
    Priority(Priority),
    DueDate(Option<NaiveDate>),
}

impl ProjectField {
    /// Parse `field=value` style input, e.g. `status` + `on-hold`.
    ///
    /// An empty due date clears it.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title(value.to_string())),
            "status" => value.parse().map(Self::Status).map_err(Error::InvalidInput),
            "priority" => value.parse().map(Self::Priority).map_err(Error::InvalidInput),
            "due" | "due-date" | "duedate" => parse_due_date(Some(value)).map(Self::DueDate),
            other => Err(Error::InvalidInput(format!(
                "unknown project field '{other}' (expected title, status, priority or due)"
            ))),
        }
    }
}

/// Parse an optional `YYYY-MM-DD` date; blank input means no date.
pub fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

/// Trimmed required text, or `InvalidInput` naming `what`.
pub(crate) fn require_text(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}
