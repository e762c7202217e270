use crate::domain::project::{Phase, Project, Task};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Unknown task {0}")]
    UnknownTask(String),
    #[error("Unknown phase {0}")]
    UnknownPhase(String),
}

/// Placement of one task before a move, used to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    task_id: String,
    phase_id: String,
    position: Option<u32>,
}

/// Proof of an applied move; hand it back to [`Board::revert`] to undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReceipt {
    pub task_id: String,
    pub phase_id: String,
    pub position: u32,
    previous: Vec<Placement>,
}

/// In-memory kanban board of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub project: Project,
    pub phases: Vec<Phase>,
    pub tasks: Vec<Task>,
}

impl Board {
    #[must_use]
    pub const fn new(project: Project, phases: Vec<Phase>, tasks: Vec<Task>) -> Self {
        Self { project, phases, tasks }
    }

    /// Tasks of a column in display order.
    #[must_use]
    pub fn tasks_for(&self, phase_id: &str) -> Vec<&Task> {
        let mut column: Vec<&Task> = self.tasks.iter().filter(|t| t.phase_id == phase_id).collect();
        column.sort_by_key(|t| t.position.unwrap_or(u32::MAX));
        column
    }

    fn column_ids(&self, phase_id: &str, excluding: &str) -> Vec<String> {
        self.tasks_for(phase_id)
            .into_iter()
            .filter(|t| t.id != excluding)
            .map(|t| t.id.clone())
            .collect()
    }

    fn renumber(&mut self, phase_id: &str, ids: &[String]) {
        for (index, id) in ids.iter().enumerate() {
            if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) {
                task.phase_id = phase_id.to_string();
                task.position = u32::try_from(index).ok();
            }
        }
    }

    /// Moves a task to `position` within `phase_id`, renumbering both columns.
    ///
    /// Positions past the end of the column append.
    ///
    /// # Errors
    /// Returns `BoardError` if the task or the target phase is not on this board.
    pub fn move_task(&mut self, task_id: &str, phase_id: &str, position: u32) -> Result<MoveReceipt, BoardError> {
        if !self.phases.iter().any(|p| p.id == phase_id) {
            return Err(BoardError::UnknownPhase(phase_id.to_string()));
        }
        let from_phase = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.phase_id.clone())
            .ok_or_else(|| BoardError::UnknownTask(task_id.to_string()))?;

        let previous = self
            .tasks
            .iter()
            .filter(|t| t.phase_id == from_phase || t.phase_id == phase_id)
            .map(|t| Placement { task_id: t.id.clone(), phase_id: t.phase_id.clone(), position: t.position })
            .collect();

        let source = self.column_ids(&from_phase, task_id);
        let mut target = if from_phase == phase_id { source.clone() } else { self.column_ids(phase_id, task_id) };
        let index = usize::try_from(position).unwrap_or(usize::MAX).min(target.len());
        target.insert(index, task_id.to_string());

        if from_phase != phase_id {
            self.renumber(&from_phase, &source);
        }
        self.renumber(phase_id, &target);

        Ok(MoveReceipt {
            task_id: task_id.to_string(),
            phase_id: phase_id.to_string(),
            position: u32::try_from(index).unwrap_or(u32::MAX),
            previous,
        })
    }

    /// Restores every placement touched by the move.
    pub fn revert(&mut self, receipt: MoveReceipt) {
        for placement in receipt.previous {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == placement.task_id) {
                task.phase_id = placement.phase_id;
                task.position = placement.position;
            }
        }
    }

    /// Replaces the local copy of a task with the server's, or adds it.
    pub fn reconcile(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        Some(self.tasks.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: &str) -> Phase {
        Phase {
            id: id.into(),
            project_id: "p1".into(),
            title: id.to_uppercase(),
            description: None,
            is_done: None,
            wip_limit: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn task(id: &str, phase_id: &str, position: u32) -> Task {
        Task {
            id: id.into(),
            project_id: "p1".into(),
            phase_id: phase_id.into(),
            title: id.into(),
            description: None,
            expiration_date: None,
            priority: None,
            attachments: Vec::new(),
            assignees: Vec::new(),
            position: Some(position),
            created_at: None,
            updated_at: None,
        }
    }

    fn board() -> Board {
        let project = Project {
            id: "p1".into(),
            title: "Board".into(),
            description: None,
            creator: None,
            collaborators: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        Board::new(
            project,
            vec![phase("todo"), phase("doing")],
            vec![task("a", "todo", 0), task("b", "todo", 1), task("c", "todo", 2), task("d", "doing", 0)],
        )
    }

    fn ids(board: &Board, phase_id: &str) -> Vec<String> {
        board.tasks_for(phase_id).into_iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_move_across_columns() {
        let mut board = board();
        let receipt = board.move_task("b", "doing", 0).expect("move");

        assert_eq!(receipt.position, 0);
        assert_eq!(ids(&board, "todo"), ["a", "c"]);
        assert_eq!(ids(&board, "doing"), ["b", "d"]);
        assert_eq!(board.tasks_for("todo")[1].position, Some(1));
    }

    #[test]
    fn test_move_within_column_and_clamp() {
        let mut board = board();
        let receipt = board.move_task("a", "todo", 99).expect("move");

        assert_eq!(receipt.position, 2);
        assert_eq!(ids(&board, "todo"), ["b", "c", "a"]);
    }

    #[test]
    fn test_revert_restores_both_columns() {
        let mut board = board();
        let before = board.clone();

        let receipt = board.move_task("c", "doing", 1).expect("move");
        assert_ne!(board, before);

        board.revert(receipt);
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_unknown_ids() {
        let mut board = board();
        assert_eq!(board.move_task("zz", "todo", 0), Err(BoardError::UnknownTask("zz".into())));
        assert_eq!(board.move_task("a", "done", 0), Err(BoardError::UnknownPhase("done".into())));
    }

    #[test]
    fn test_reconcile_replaces_or_appends() {
        let mut board = board();
        let mut server_copy = task("a", "doing", 3);
        server_copy.title = "renamed".into();
        board.reconcile(server_copy);
        board.reconcile(task("e", "todo", 5));

        assert_eq!(board.tasks.len(), 5);
        assert_eq!(board.tasks[0].title, "renamed");
        assert!(board.remove_task("e").is_some());
        assert!(board.remove_task("e").is_none());
    }
}
