//! Services shared by command implementations, built once per invocation.

use crate::auth::{AuthService, User};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::reminder::{FileNotifier, ReminderScheduler};
use crate::storage::{default_data_dir, FileStore, TaskStore};
use crate::task::Task;

use super::GlobalOptions;

pub type Registry = TaskRegistry<FileStore, FileNotifier<FileStore>>;

pub struct AppContext {
    pub store: FileStore,
    pub config: Config,
}

impl AppContext {
    pub fn load(global: &GlobalOptions) -> Result<Self> {
        let root = match &global.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let store = FileStore::new(root);
        store.init()?;
        let config = Config::load_from_dir(store.root());
        Ok(Self { store, config })
    }

    pub fn auth(&self) -> AuthService<FileStore> {
        AuthService::new(self.store.clone())
    }

    pub fn registry(&self) -> Result<Registry> {
        let scheduler = ReminderScheduler::new(
            FileNotifier::new(self.store.clone()),
            self.config.reminders.clone(),
        );
        Ok(TaskRegistry::open(TaskStore::new(self.store.clone()), scheduler)?
            .with_limits(self.config.tasks.limits()))
    }

    /// Logged-in user plus the task registry.
    pub fn session(&self) -> Result<(User, Registry)> {
        let user = self.auth().require_user()?;
        Ok((user, self.registry()?))
    }
}

/// Task `id` when it belongs to `user`. Other users' tasks are reported as
/// not found.
pub fn owned_task(registry: &Registry, user: &User, id: &str) -> Result<Task> {
    registry
        .get(id)
        .filter(|task| task.owner == user.username)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}
