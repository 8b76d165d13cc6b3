use serde::{Deserialize, Serialize};

use crate::service::ServiceKind;

/// Unique task identifier, assigned by the workload source.
pub type TaskId = u64;

/// Index of a scheduling node inside the topology.
pub type NodeId = usize;

/// Simulated time in seconds.
pub type SimTime = f64;

/// Service class of a task. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    Emergency,
    Safety,
    Normal,
}

impl TaskClass {
    /// All classes in strict service order (most important first).
    pub const ALL: [TaskClass; 3] = [TaskClass::Emergency, TaskClass::Safety, TaskClass::Normal];

    /// Class importance `g` used by the priority score.
    pub fn importance(self) -> f64 {
        match self {
            TaskClass::Emergency => 1.0,
            TaskClass::Safety => 0.5,
            TaskClass::Normal => 0.0,
        }
    }

    /// Position of this class in [`TaskClass::ALL`].
    pub fn index(self) -> usize {
        match self {
            TaskClass::Emergency => 0,
            TaskClass::Safety => 1,
            TaskClass::Normal => 2,
        }
    }

    pub fn is_emergency(self) -> bool {
        self == TaskClass::Emergency
    }
}

impl std::fmt::Display for TaskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskClass::Emergency => write!(f, "emergency"),
            TaskClass::Safety => write!(f, "safety"),
            TaskClass::Normal => write!(f, "normal"),
        }
    }
}

/// Planar position in city coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One unit of work offered to a scheduling node.
///
/// Identity, class and timing are fixed at creation. `remaining` only ever
/// decreases, and the lifecycle stamps `start` and `completion` are written
/// once each by the node that owns the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub class: TaskClass,
    pub kind: ServiceKind,
    pub position: Position,
    /// Payload transferred over the node's link, in MB.
    pub data_size: f64,
    pub arrival: SimTime,
    pub relative_deadline: SimTime,
    pub absolute_deadline: SimTime,
    /// Total processing demand in work units.
    pub demand: f64,
    /// Work still to be done. Starts at `demand`.
    pub remaining: f64,
    pub start: Option<SimTime>,
    pub completion: Option<SimTime>,
    pub assigned_node: Option<NodeId>,
}

impl Task {
    /// Create a task with the catalogue defaults of its class.
    ///
    /// The service kind defaults to the representative kind of the class;
    /// use [`Task::from_kind`] when the kind matters.
    pub fn new(
        id: TaskId,
        class: TaskClass,
        arrival: SimTime,
        demand: f64,
        relative_deadline: SimTime,
    ) -> Self {
        Self {
            id,
            class,
            kind: ServiceKind::representative(class),
            position: Position::default(),
            data_size: 0.0,
            arrival,
            relative_deadline,
            absolute_deadline: arrival + relative_deadline,
            demand,
            remaining: demand.max(0.0),
            start: None,
            completion: None,
            assigned_node: None,
        }
    }

    /// Create a task from the service catalogue entry of `kind`.
    pub fn from_kind(id: TaskId, kind: ServiceKind, arrival: SimTime, position: Position) -> Self {
        let mut task = Self::new(
            id,
            kind.class(),
            arrival,
            kind.demand(),
            kind.relative_deadline(),
        );
        task.kind = kind;
        task.position = position;
        task.data_size = kind.data_size();
        task
    }

    pub fn with_data_size(mut self, data_size: f64) -> Self {
        self.data_size = data_size;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// End-to-end latency, if the task has completed.
    pub fn latency(&self) -> Option<SimTime> {
        self.completion.map(|c| c - self.arrival)
    }

    /// Queueing delay before first execution, if the task has started.
    pub fn waiting_time(&self) -> Option<SimTime> {
        self.start.map(|s| s - self.arrival)
    }

    /// Whether the task finished by its absolute deadline. `None` while running.
    pub fn deadline_met(&self) -> Option<bool> {
        self.completion.map(|c| c <= self.absolute_deadline)
    }

    /// Time left until the absolute deadline at `now` (negative once missed).
    pub fn slack(&self, now: SimTime) -> SimTime {
        self.absolute_deadline - now
    }

    /// Time spent in the system since arrival at `now`.
    pub fn waited(&self, now: SimTime) -> SimTime {
        now - self.arrival
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_deadline_is_arrival_plus_relative() {
        let task = Task::new(1, TaskClass::Emergency, 4.0, 5.0, 10.0);
        assert_eq!(task.absolute_deadline, 14.0);
        assert_eq!(task.remaining, 5.0);
        assert!(task.start.is_none());
        assert!(task.latency().is_none());
        assert!(task.deadline_met().is_none());
    }

    #[test]
    fn class_importance() {
        assert_eq!(TaskClass::Emergency.importance(), 1.0);
        assert_eq!(TaskClass::Safety.importance(), 0.5);
        assert_eq!(TaskClass::Normal.importance(), 0.0);
    }

    #[test]
    fn class_order_matches_index() {
        for (i, class) in TaskClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
        assert!(TaskClass::Emergency < TaskClass::Normal);
    }

    #[test]
    fn latency_and_deadline_after_completion() {
        let mut task = Task::new(7, TaskClass::Normal, 2.0, 1.0, 3.0);
        task.start = Some(3.0);
        task.completion = Some(6.0);
        assert_eq!(task.latency(), Some(4.0));
        assert_eq!(task.waiting_time(), Some(1.0));
        assert_eq!(task.deadline_met(), Some(false));

        task.completion = Some(5.0);
        assert_eq!(task.deadline_met(), Some(true));
    }

    #[test]
    fn slack_goes_negative_past_deadline() {
        let task = Task::new(1, TaskClass::Safety, 0.0, 1.0, 2.0);
        assert_eq!(task.slack(1.0), 1.0);
        assert_eq!(task.slack(3.0), -1.0);
        assert_eq!(task.waited(3.0), 3.0);
    }

    #[test]
    fn negative_demand_is_clamped() {
        let task = Task::new(1, TaskClass::Normal, 0.0, -3.0, 1.0);
        assert_eq!(task.remaining, 0.0);
    }

    #[test]
    fn from_kind_uses_catalogue() {
        let task = Task::from_kind(3, ServiceKind::CollisionAlert, 1.0, Position::new(2.0, 3.0));
        assert_eq!(task.class, TaskClass::Emergency);
        assert_eq!(task.demand, 15.0);
        assert_eq!(task.absolute_deadline, 6.0);
        assert_eq!(task.data_size, 1.5);
        assert_eq!(task.position, Position::new(2.0, 3.0));
    }

    #[test]
    fn position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
