use crate::domain;
use crate::domain::todo::{NewTask, Priority, TodoTask, UpdateTask};
use anyhow::anyhow;
use std::sync::RwLock;

const STORE_NAME: &str = "todo store";

/// Ordered list of todos plus the counter used to hand out IDs. The counter only ever moves
/// forward, so the ID of a deleted todo is never handed out again.
pub struct InMemoryTaskStore {
    tasks: Vec<TodoTask>,
    next_id: u32,
}

impl InMemoryTaskStore {
    pub fn new() -> InMemoryTaskStore {
        InMemoryTaskStore {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates the store with the two sample todos every fresh process starts with
    pub fn new_seeded() -> InMemoryTaskStore {
        InMemoryTaskStore {
            tasks: vec![
                TodoTask {
                    id: 1,
                    text: "Sample task 1".to_owned(),
                    completed: false,
                    priority: Priority::Medium,
                },
                TodoTask {
                    id: 2,
                    text: "Sample completed task".to_owned(),
                    completed: true,
                    priority: Priority::Low,
                },
            ],
            next_id: 3,
        }
    }

    pub fn new_seeded_locked() -> RwLock<InMemoryTaskStore> {
        RwLock::new(Self::new_seeded())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl domain::todo::driven_ports::TaskReader for RwLock<InMemoryTaskStore> {
    async fn all_tasks(&self) -> Result<Vec<TodoTask>, anyhow::Error> {
        let store = self.read().map_err(domain::poisoned(STORE_NAME))?;

        Ok(store.tasks.clone())
    }
}

impl domain::todo::driven_ports::TaskWriter for RwLock<InMemoryTaskStore> {
    async fn create_task(&self, new_task: &NewTask) -> Result<TodoTask, anyhow::Error> {
        let mut store = self.write().map_err(domain::poisoned(STORE_NAME))?;
        let following_id = store
            .next_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("{STORE_NAME} has run out of todo IDs"))?;

        let task = TodoTask {
            id: store.next_id,
            text: new_task.text.clone(),
            completed: false,
            priority: new_task.priority,
        };
        store.next_id = following_id;
        store.tasks.push(task.clone());

        Ok(task)
    }

    async fn update_task(
        &self,
        task_id: u32,
        update: &UpdateTask,
    ) -> Result<Option<TodoTask>, anyhow::Error> {
        let mut store = self.write().map_err(domain::poisoned(STORE_NAME))?;

        let updated = store
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .map(|task| {
                task.apply(update);
                task.clone()
            });

        Ok(updated)
    }

    async fn delete_task(&self, task_id: u32) -> Result<(), anyhow::Error> {
        let mut store = self.write().map_err(domain::poisoned(STORE_NAME))?;
        store.tasks.retain(|task| task.id != task_id);

        Ok(())
    }
}
