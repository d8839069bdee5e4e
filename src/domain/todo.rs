use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use anyhow::Context;
use derive_more::Display;
use tracing::{info, warn};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Display)]
pub enum Priority {
    #[display("low")]
    Low,
    #[default]
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TodoTask {
    pub id: u32,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

impl TodoTask {
    /// Merges the fields present on [update] into this task, leaving the rest untouched
    pub fn apply(&mut self, update: &UpdateTask) {
        if let Some(ref text) = update.text {
            self.text = text.clone();
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
    }
}

#[derive(Display)]
#[display("\"{text}\" ({priority})")]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
}

#[derive(Default)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateTask {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        async fn all_tasks(&self) -> Result<Vec<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task(&self, new_task: &NewTask) -> Result<TodoTask, anyhow::Error>;

        /// Returns the task after the update, or [None] if no task had the given ID
        async fn update_task(
            &self,
            task_id: u32,
            update: &UpdateTask,
        ) -> Result<Option<TodoTask>, anyhow::Error>;

        async fn delete_task(&self, task_id: u32) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("todo {0} does not exist")]
        DoesNotExist(u32),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn all_tasks(
            &self,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;
        async fn create_task(
            &self,
            task: &NewTask,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, anyhow::Error>;
        async fn update_task(
            &self,
            task_id: u32,
            update: &UpdateTask,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;
        async fn delete_task(
            &self,
            task_id: u32,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), anyhow::Error>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn all_tasks(&self, task_read: &impl TaskReader) -> Result<Vec<TodoTask>, anyhow::Error> {
        task_read.all_tasks().await.context("listing todos")
    }

    async fn create_task(
        &self,
        task: &NewTask,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, anyhow::Error> {
        let created = task_write
            .create_task(task)
            .await
            .context("creating a todo")?;
        info!(task_id = created.id, "Created todo {task}");

        Ok(created)
    }

    async fn update_task(
        &self,
        task_id: u32,
        update: &UpdateTask,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let updated = task_write
            .update_task(task_id, update)
            .await
            .context("updating a todo")?;

        match updated {
            Some(task) => Ok(task),
            None => {
                warn!(task_id, "Tried to update a todo that doesn't exist");
                Err(TaskError::DoesNotExist(task_id))
            }
        }
    }

    async fn delete_task(&self, task_id: u32, task_write: &impl TaskWriter) -> Result<(), anyhow::Error> {
        task_write
            .delete_task(task_id)
            .await
            .context("deleting a todo")?;
        Ok(())
    }
}
