use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl From<Priority> for domain::todo::Priority {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Low => domain::todo::Priority::Low,
            Priority::Medium => domain::todo::Priority::Medium,
            Priority::High => domain::todo::Priority::High,
        }
    }
}

impl From<domain::todo::Priority> for Priority {
    fn from(value: domain::todo::Priority) -> Self {
        match value {
            domain::todo::Priority::Low => Priority::Low,
            domain::todo::Priority::Medium => Priority::Medium,
            domain::todo::Priority::High => Priority::High,
        }
    }
}

/// DTO for a todo returned on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoTask {
    #[schema(example = 3)]
    pub id: u32,
    #[schema(example = "buy milk")]
    pub text: String,
    #[schema(example = false)]
    pub completed: bool,
    pub priority: Priority,
}

impl From<domain::todo::TodoTask> for TodoTask {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoTask {
            id: value.id,
            text: value.text,
            completed: value.completed,
            priority: value.priority.into(),
        }
    }
}

/// DTO for creating a todo. Priority defaults to "medium".
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(length(min = 1, max = 500))]
    #[schema(example = "buy milk")]
    pub text: String,
    pub priority: Option<Priority>,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask {
            text: value.text,
            priority: value.priority.map(Into::into).unwrap_or_default(),
        }
    }
}

/// DTO for changing a todo. Only the fields that are present get changed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 500))]
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl From<UpdateTask> for domain::todo::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::todo::UpdateTask {
            text: value.text,
            completed: value.completed,
            priority: value.priority.map(Into::into),
        }
    }
}
