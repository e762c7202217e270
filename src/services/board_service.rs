use crate::domain::board::Board;
use crate::domain::project::{Task, TaskQuery};
use crate::error::Result;
use crate::services::{PhaseService, ProjectService, TaskService};

/// Kanban board of one project with optimistic task moves.
#[derive(Clone, Debug)]
pub struct BoardService {
    projects: ProjectService,
    phases: PhaseService,
    tasks: TaskService,
}

impl BoardService {
    #[must_use]
    pub const fn new(projects: ProjectService, phases: PhaseService, tasks: TaskService) -> Self {
        Self { projects, phases, tasks }
    }

    /// Fetches the project, its phases and its tasks concurrently.
    ///
    /// # Errors
    /// Returns the first failing fetch.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn load(&self, project_id: &str) -> Result<Board> {
        let query = TaskQuery { project_id: project_id.to_string(), ..Default::default() };
        let (project, phases, tasks) = tokio::try_join!(
            self.projects.get(project_id),
            self.phases.list(project_id),
            self.tasks.list(&query),
        )?;
        tracing::debug!(phases = phases.len(), tasks = tasks.len(), "Board loaded");
        Ok(Board::new(project, phases, tasks))
    }

    /// Moves the task locally, then on the backend.
    ///
    /// On success the backend's copy replaces the local one; on failure the
    /// local move is undone and the error returned.
    ///
    /// # Errors
    /// Returns `AppError::Board` for ids not on the board, otherwise the error of the move request.
    #[tracing::instrument(skip(self, board), fields(project_id = %board.project.id), err(level = "debug"))]
    pub async fn move_task(&self, board: &mut Board, task_id: &str, phase_id: &str, position: u32) -> Result<Task> {
        let receipt = board.move_task(task_id, phase_id, position)?;

        match self.tasks.move_task(task_id, &receipt.phase_id, receipt.position).await {
            Ok(mut task) => {
                if task.project_id.is_empty() {
                    task.project_id.clone_from(&board.project.id);
                }
                if task.phase_id.is_empty() {
                    task.phase_id.clone_from(&receipt.phase_id);
                }
                board.reconcile(task.clone());
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(task_id, error = %e, "Move rejected, restoring board");
                board.revert(receipt);
                Err(e)
            }
        }
    }
}
