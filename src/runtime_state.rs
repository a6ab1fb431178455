use super::*;

/// Behaviors a listener can run. Listeners are plain data so the page can dispatch
/// them without holding closures over its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Handler {
    ToggleNav,
    CloseNavOnLinkClick,
    SmoothScrollToFragment,
    ScheduleScrollSpy,
    SubmitContactForm,
}

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: Handler,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    /// Adding the same handler twice for one node, event and phase is a no-op,
    /// matching `addEventListener` with an identical callback.
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, listener: Listener) -> bool {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();
        if listeners
            .iter()
            .any(|existing| existing.capture == listener.capture && existing.handler == listener.handler)
        {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self) -> usize {
        self.map
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) time_stamp_ms: i64,
    pub(crate) default_prevented: bool,
    pub(crate) cancelable: bool,
    pub(crate) propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId, time_stamp_ms: i64) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            time_stamp_ms,
            default_prevented: false,
            cancelable: true,
            propagation_stopped: false,
        }
    }

    pub(crate) fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// Work the page defers to its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Next rendering opportunity: queued frame callbacks, then visibility observation.
    AnimationFrame,
    /// End of the simulated contact form network delay.
    ContactSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameCallback {
    ScrollSpy,
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) kind: TaskKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
    pub kind: TaskKind,
}

#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) task_queue: Vec<ScheduledTask>,
    pub(crate) frame_callbacks: Vec<FrameCallback>,
    pub(crate) frame_task_id: Option<i64>,
    pub(crate) now_ms: i64,
    pub(crate) frame_interval_ms: i64,
    pub(crate) timer_step_limit: usize,
    pub(crate) next_timer_id: i64,
    pub(crate) next_task_order: i64,
    pub(crate) frames_rendered: u64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            frame_callbacks: Vec::new(),
            frame_task_id: None,
            now_ms: 0,
            frame_interval_ms: 16,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
            frames_rendered: 0,
        }
    }
}

impl SchedulerState {
    pub(crate) fn allocate_timer_id(&mut self) -> i64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        id
    }

    pub(crate) fn allocate_task_order(&mut self) -> i64 {
        let order = self.next_task_order;
        self.next_task_order += 1;
        order
    }

    /// First frame boundary strictly after `now_ms`.
    pub(crate) fn next_frame_at(&self) -> i64 {
        let interval = self.frame_interval_ms.max(1);
        self.now_ms
            .div_euclid(interval)
            .saturating_add(1)
            .saturating_mul(interval)
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) behaviors: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            behaviors: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_store_ignores_duplicate_registrations() {
        let mut store = ListenerStore::default();
        let listener = Listener {
            capture: false,
            handler: Handler::ToggleNav,
        };
        assert!(store.add(NodeId(3), "click", listener.clone()));
        assert!(!store.add(NodeId(3), "click", listener));
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(NodeId(3), "click", false).len(), 1);
        assert!(store.get(NodeId(3), "click", true).is_empty());
    }

    #[test]
    fn frames_land_on_the_next_boundary() {
        let mut scheduler = SchedulerState::default();
        assert_eq!(scheduler.next_frame_at(), 16);
        scheduler.now_ms = 16;
        assert_eq!(scheduler.next_frame_at(), 32);
        scheduler.now_ms = 17;
        assert_eq!(scheduler.next_frame_at(), 32);
    }

    #[test]
    fn prevent_default_respects_cancelable() {
        let mut event = EventState::new("scroll", NodeId(0), 0);
        event.cancelable = false;
        event.prevent_default();
        assert!(!event.default_prevented);
    }
}
