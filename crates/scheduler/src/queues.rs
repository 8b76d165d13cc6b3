use std::collections::VecDeque;

use fogsim_core::{Task, TaskClass};

/// One FIFO lane per task class, indexed in [`TaskClass::ALL`] order.
#[derive(Debug, Clone, Default)]
pub struct ClassQueues {
    lanes: [VecDeque<Task>; 3],
}

impl ClassQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back of the task's class lane.
    pub fn push_back(&mut self, task: Task) {
        self.lanes[task.class.index()].push_back(task);
    }

    /// Return a task to the front of its class lane.
    pub fn push_front(&mut self, task: Task) {
        self.lanes[task.class.index()].push_front(task);
    }

    pub fn lane(&self, class: TaskClass) -> &VecDeque<Task> {
        &self.lanes[class.index()]
    }

    pub(crate) fn lanes_mut(&mut self) -> impl Iterator<Item = &mut VecDeque<Task>> {
        self.lanes.iter_mut()
    }

    /// Remove the task at `index` of the `class` lane.
    pub fn remove(&mut self, class: TaskClass, index: usize) -> Option<Task> {
        self.lanes[class.index()].remove(index)
    }

    /// All queued tasks, Emergency lane first, each lane in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.lanes.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    /// Sum of remaining work over every queued task.
    pub fn remaining_work(&self) -> f64 {
        self.iter().map(|t| t.remaining).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_by_class() {
        let mut q = ClassQueues::new();
        q.push_back(Task::new(1, TaskClass::Normal, 0.0, 1.0, 10.0));
        q.push_back(Task::new(2, TaskClass::Emergency, 0.0, 2.0, 10.0));
        q.push_back(Task::new(3, TaskClass::Emergency, 0.0, 3.0, 10.0));

        assert_eq!(q.len(), 3);
        assert_eq!(q.lane(TaskClass::Emergency).len(), 2);
        assert!(q.lane(TaskClass::Safety).is_empty());
        let order: Vec<u64> = q.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(q.remaining_work(), 6.0);
    }

    #[test]
    fn push_front_and_remove() {
        let mut q = ClassQueues::new();
        q.push_back(Task::new(1, TaskClass::Safety, 0.0, 1.0, 10.0));
        q.push_front(Task::new(2, TaskClass::Safety, 0.0, 1.0, 10.0));
        assert_eq!(q.lane(TaskClass::Safety)[0].id, 2);

        let removed = q.remove(TaskClass::Safety, 1).unwrap();
        assert_eq!(removed.id, 1);
        assert!(q.remove(TaskClass::Safety, 5).is_none());
        assert_eq!(q.len(), 1);
        assert!(!q.is_empty());
    }
}
