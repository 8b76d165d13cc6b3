use std::collections::VecDeque;

use fogsim_core::{NodeConfig, Policy, SimTime, Task};

use crate::adapter::WeightAdapter;
use crate::queues::ClassQueues;
use crate::sla::CompletionWindow;

/// Queue layout of a node, chosen once from its [`Policy`].
///
/// The three fixed disciplines service tasks in place at the head of their
/// queue. Only the adaptive discipline has an execution slot, a completion
/// window and weight state.
#[derive(Debug)]
pub(crate) enum Discipline {
    Fifo {
        queue: VecDeque<Task>,
    },
    EmergencyFirst {
        emergency: VecDeque<Task>,
        normal: VecDeque<Task>,
    },
    StaticPriority {
        queues: ClassQueues,
    },
    SlaDynamic(Box<AdaptiveState>),
}

#[derive(Debug)]
pub(crate) struct AdaptiveState {
    pub(crate) queues: ClassQueues,
    pub(crate) running: Option<Task>,
    pub(crate) window: CompletionWindow,
    pub(crate) adapter: WeightAdapter,
    pub(crate) last_window: SimTime,
    pub(crate) window_length: f64,
    pub(crate) preemption: bool,
}

impl AdaptiveState {
    fn new(config: &NodeConfig) -> Self {
        Self {
            queues: ClassQueues::new(),
            running: None,
            window: CompletionWindow::new(config.sla.window),
            adapter: WeightAdapter::new(&config.sla),
            last_window: 0.0,
            window_length: config.sla.window,
            preemption: config.sla.preemption,
        }
    }

    /// Remaining work of every queued task plus the running one.
    pub(crate) fn backlog(&self) -> f64 {
        self.queues.remaining_work() + self.running.as_ref().map_or(0.0, |t| t.remaining)
    }
}

impl Discipline {
    pub(crate) fn for_config(config: &NodeConfig) -> Self {
        match config.policy {
            Policy::Fifo => Discipline::Fifo {
                queue: VecDeque::new(),
            },
            Policy::EmergencyFirst => Discipline::EmergencyFirst {
                emergency: VecDeque::new(),
                normal: VecDeque::new(),
            },
            Policy::StaticPriority => Discipline::StaticPriority {
                queues: ClassQueues::new(),
            },
            Policy::SlaDynamic => Discipline::SlaDynamic(Box::new(AdaptiveState::new(config))),
        }
    }

    /// Tasks counted against the queue bound.
    ///
    /// The adaptive discipline counts its execution slot too; the others
    /// keep the in-progress task at the head of its queue.
    pub(crate) fn len(&self) -> usize {
        match self {
            Discipline::Fifo { queue } => queue.len(),
            Discipline::EmergencyFirst { emergency, normal } => emergency.len() + normal.len(),
            Discipline::StaticPriority { queues } => queues.len(),
            Discipline::SlaDynamic(state) => {
                state.queues.len() + usize::from(state.running.is_some())
            }
        }
    }

    /// Remaining work held by the node.
    pub(crate) fn backlog(&self) -> f64 {
        match self {
            Discipline::Fifo { queue } => queue.iter().map(|t| t.remaining).sum(),
            Discipline::EmergencyFirst { emergency, normal } => {
                emergency.iter().chain(normal.iter()).map(|t| t.remaining).sum()
            }
            Discipline::StaticPriority { queues } => queues.remaining_work(),
            Discipline::SlaDynamic(state) => state.backlog(),
        }
    }

    /// Every task the node holds, in service-lane order.
    pub(crate) fn tasks(&self) -> Box<dyn Iterator<Item = &Task> + '_> {
        match self {
            Discipline::Fifo { queue } => Box::new(queue.iter()),
            Discipline::EmergencyFirst { emergency, normal } => {
                Box::new(emergency.iter().chain(normal.iter()))
            }
            Discipline::StaticPriority { queues } => Box::new(queues.iter()),
            Discipline::SlaDynamic(state) => {
                Box::new(state.running.iter().chain(state.queues.iter()))
            }
        }
    }

    pub(crate) fn adaptive(&self) -> Option<&AdaptiveState> {
        match self {
            Discipline::SlaDynamic(state) => Some(state),
            _ => None,
        }
    }
}
