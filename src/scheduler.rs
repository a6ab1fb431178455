use super::*;

impl Page {
    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    /// Animation frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.scheduler.frames_rendered
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .scheduler
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                kind: task.kind,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        let target = self.scheduler.now_ms.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(target), true)?;
        self.scheduler.now_ms = target;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={} from={} to={} ran_due={}",
            delta_ms, from, self.scheduler.now_ms, ran
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(target_ms), true)?;
        self.scheduler.now_ms = target_ms;
        self.trace_timer_line(format!(
            "[timer] advance_to from={} to={} ran_due={}",
            from, self.scheduler.now_ms, ran
        ));
        Ok(())
    }

    /// Runs every queued task, moving the clock forward as needed.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.trace_timer_line(format!(
            "[timer] flush from={} to={} ran={}",
            from, self.scheduler.now_ms, ran
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(next_idx) = self.next_task_index(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };

        let task = self.scheduler.task_queue.remove(next_idx);
        if task.due_at > self.scheduler.now_ms {
            self.scheduler.now_ms = task.due_at;
        }
        self.execute_task(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms), false)?;
        self.trace_timer_line(format!(
            "[timer] run_due now_ms={} ran={}",
            self.scheduler.now_ms, ran
        ));
        Ok(ran)
    }

    /// Moves the clock to the next frame boundary and renders, even when
    /// nothing asked for a frame.
    pub fn render_frame(&mut self) -> Result<()> {
        let due_at = self.ensure_frame_task();
        self.advance_time_to(due_at.max(self.scheduler.now_ms))
    }

    /// Queues `callback` for the next animation frame. Returns `false` when it
    /// was already queued for that frame.
    pub(crate) fn request_animation_frame(&mut self, callback: FrameCallback) -> bool {
        if self.scheduler.frame_callbacks.contains(&callback) {
            return false;
        }
        self.scheduler.frame_callbacks.push(callback);
        self.ensure_frame_task();
        true
    }

    /// Geometry changed: visibility has to be observed again at the next frame.
    pub(crate) fn request_rendering(&mut self) {
        if self.reveal.has_observed_targets() {
            self.ensure_frame_task();
        }
    }

    fn ensure_frame_task(&mut self) -> i64 {
        if let Some(id) = self.scheduler.frame_task_id {
            if let Some(task) = self.scheduler.task_queue.iter().find(|task| task.id == id) {
                return task.due_at;
            }
        }
        let due_at = self.scheduler.next_frame_at();
        let id = self.queue_task(TaskKind::AnimationFrame, due_at);
        self.scheduler.frame_task_id = Some(id);
        due_at
    }

    pub(crate) fn set_timeout(&mut self, kind: TaskKind, delay_ms: i64) -> i64 {
        let due_at = self.scheduler.now_ms.saturating_add(delay_ms.max(0));
        self.queue_task(kind, due_at)
    }

    fn queue_task(&mut self, kind: TaskKind, due_at: i64) -> i64 {
        let id = self.scheduler.allocate_timer_id();
        let order = self.scheduler.allocate_task_order();
        self.scheduler.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            kind,
        });
        self.trace_timer_line(format!(
            "[timer] schedule id={} kind={:?} due_at={}",
            id, kind, due_at
        ));
        id
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(self.timer_step_limit_error(steps, due_limit));
            }
            let task = self.scheduler.task_queue.remove(next_idx);
            if advance_clock && task.due_at > self.scheduler.now_ms {
                self.scheduler.now_ms = task.due_at;
            }
            self.execute_task(task)?;
        }
        Ok(steps)
    }

    fn timer_step_limit_error(&self, steps: usize, due_limit: Option<i64>) -> Error {
        let due_limit_desc = due_limit
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());
        let next_task_desc = self
            .next_task_index(due_limit)
            .and_then(|idx| self.scheduler.task_queue.get(idx))
            .map(|task| {
                format!(
                    "id={},due_at={},order={},kind={:?}",
                    task.id, task.due_at, task.order, task.kind
                )
            })
            .unwrap_or_else(|| "none".into());

        Error::Runtime(format!(
            "timer queue exceeded max task steps: limit={}, steps={steps}, now_ms={}, due_limit={}, pending_tasks={}, next_task={}",
            self.scheduler.timer_step_limit,
            self.scheduler.now_ms,
            due_limit_desc,
            self.scheduler.task_queue.len(),
            next_task_desc
        ))
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.scheduler
            .task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn execute_task(&mut self, task: ScheduledTask) -> Result<()> {
        self.trace_timer_line(format!(
            "[timer] run id={} kind={:?} due_at={} now_ms={}",
            task.id, task.kind, task.due_at, self.scheduler.now_ms
        ));
        match task.kind {
            TaskKind::AnimationFrame => self.run_animation_frame(task.id),
            TaskKind::ContactSubmission => self.complete_contact_submission(),
        }
    }

    /// Frame callbacks run first, then visibility is observed against the
    /// layout they leave behind.
    fn run_animation_frame(&mut self, task_id: i64) -> Result<()> {
        if self.scheduler.frame_task_id == Some(task_id) {
            self.scheduler.frame_task_id = None;
        }
        let callbacks = std::mem::take(&mut self.scheduler.frame_callbacks);
        for callback in callbacks {
            match callback {
                FrameCallback::ScrollSpy => self.run_scroll_spy()?,
            }
        }
        self.update_reveal_observations()?;
        self.scheduler.frames_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_time_rejects_negative_delta() -> Result<()> {
        let mut page = Page::from_html("<p>static</p>")?;
        let err = page.advance_time(-1).expect_err("negative delta");
        assert!(matches!(err, Error::Runtime(msg) if msg.contains("non-negative")));
        Ok(())
    }

    #[test]
    fn advance_time_to_rejects_past_target() -> Result<()> {
        let mut page = Page::from_html("<p>static</p>")?;
        page.advance_time(50)?;
        assert!(page.advance_time_to(10).is_err());
        assert_eq!(page.now_ms(), 50);
        Ok(())
    }

    #[test]
    fn render_frame_lands_on_frame_boundary() -> Result<()> {
        let mut page = Page::from_html("<p>static</p>")?;
        page.advance_time(5)?;
        page.render_frame()?;
        assert_eq!(page.now_ms(), 16);
        assert_eq!(page.frames_rendered(), 1);
        assert!(page.pending_timers().is_empty());
        Ok(())
    }

    #[test]
    fn animation_frame_requests_coalesce() -> Result<()> {
        let mut page = Page::from_html("<p>static</p>")?;
        assert!(page.request_animation_frame(FrameCallback::ScrollSpy));
        assert!(!page.request_animation_frame(FrameCallback::ScrollSpy));
        let timers = page.pending_timers();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].kind, TaskKind::AnimationFrame);
        assert_eq!(timers[0].due_at, 16);
        Ok(())
    }

    #[test]
    fn timer_step_limit_bounds_flush() -> Result<()> {
        let mut page = Page::from_html("<p>static</p>")?;
        page.set_timeout(TaskKind::AnimationFrame, 0);
        page.set_timeout(TaskKind::AnimationFrame, 5);
        page.set_timer_step_limit(1)?;
        let err = page.flush().expect_err("step limit");
        assert!(matches!(err, Error::Runtime(msg) if msg.contains("limit=1")));
        Ok(())
    }
}
