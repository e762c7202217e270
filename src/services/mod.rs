use crate::api::ApiClient;
use crate::config::{ApiConfig, StorageConfig};
use crate::error::Result;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, Preferences};
use std::sync::Arc;

pub mod auth_call;
pub mod board_service;
pub mod notification_service;
pub mod phase_service;
pub mod project_service;
pub mod session_service;
pub mod task_service;

pub use auth_call::{AuthenticatedCall, TokenRefresher};
pub use board_service::BoardService;
pub use notification_service::NotificationService;
pub use phase_service::PhaseService;
pub use project_service::ProjectService;
pub use session_service::SessionManager;
pub use task_service::TaskService;

/// Every service of the client wired around one session and one store.
#[derive(Clone, Debug)]
pub struct Client {
    pub session: Arc<SessionManager>,
    pub projects: ProjectService,
    pub phases: PhaseService,
    pub tasks: TaskService,
    pub notifications: NotificationService,
    pub boards: BoardService,
    pub preferences: Preferences,
}

impl Client {
    /// Opens the configured store and wires the services around it.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the state file cannot be opened, or
    /// `AppError::Network` if the HTTP client cannot be built.
    pub fn new(api: &ApiConfig, storage: &StorageConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = if storage.in_memory {
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(FileStore::open(&storage.state_file)?)
        };
        Self::with_store(api, store)
    }

    /// # Errors
    /// Returns `AppError::Network` if the HTTP client cannot be built.
    pub fn with_store(api: &ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let api = ApiClient::new(api)?;
        let session = Arc::new(SessionManager::new(api.clone(), Arc::clone(&store)));
        let auth = AuthenticatedCall::new(Arc::clone(&session) as Arc<dyn TokenRefresher>);

        let projects = ProjectService::new(api.clone(), auth.clone());
        let phases = PhaseService::new(api.clone(), auth.clone());
        let tasks = TaskService::new(api.clone(), auth.clone());
        let notifications = NotificationService::new(api, auth, session.notifications().clone());
        let boards = BoardService::new(projects.clone(), phases.clone(), tasks.clone());

        Ok(Self {
            session,
            projects,
            phases,
            tasks,
            notifications,
            boards,
            preferences: Preferences::new(store),
        })
    }
}
