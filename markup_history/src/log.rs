// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The undo/redo log.

use core::fmt;

use markup_model::AnnotationId;
use tracing::{debug, trace};

use crate::{AnnotationStore, Command, CommandFlags};

/// A log-mutating operation, reported to listeners after it completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryChange {
    /// A command was applied (recorded, merged, or discarded as a no-op).
    Executed {
        /// The command's target.
        target: AnnotationId,
    },
    /// One undo step was reverted.
    Undone,
    /// One undo step was re-applied.
    Redone,
    /// An action group was closed and recorded as one step.
    GroupClosed,
    /// An action group was rolled back and discarded.
    GroupCancelled,
    /// Both stacks were emptied.
    Cleared,
}

type Listener = Box<dyn FnMut(&HistoryChange)>;

/// One undo step: a single command or a closed group, applied in order.
type Entry = Vec<Command>;

#[derive(Debug, Default)]
struct OpenGroup {
    depth: usize,
    commands: Vec<Command>,
}

/// A grouped, merging undo/redo log.
///
/// - [`execute`](Self::execute) applies a command, then tries to merge it into the previous
///   command (the last one of the open group, or a single-command top entry). A command that
///   turns out to change nothing is dropped instead of recorded.
/// - [`begin_group`](Self::begin_group) / [`close_group`](Self::close_group) nest; the
///   outermost close records everything in between as one step.
///   [`cancel_group`](Self::cancel_group) reverts and discards the open group.
/// - A fresh execute clears the redo stack.
///
/// Listeners registered with [`on_change`](Self::on_change) hear about every log-mutating
/// operation.
pub struct ActionLog {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    group: Option<OpenGroup>,
    limit: Option<usize>,
    revision: u64,
    listeners: Vec<Listener>,
    last_selection: Option<AnnotationId>,
}

impl fmt::Debug for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionLog")
            .field("undo", &self.undo.len())
            .field("redo", &self.redo.len())
            .field("group", &self.group)
            .field("limit", &self.limit)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .field("last_selection", &self.last_selection)
            .finish()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    /// An empty, unbounded log.
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            group: None,
            limit: None,
            revision: 0,
            listeners: Vec::new(),
            last_selection: None,
        }
    }

    /// An empty log keeping at most `limit` undo steps; the oldest drop first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::new()
        }
    }

    /// Register a listener for log-mutating operations.
    pub fn on_change(&mut self, listener: impl FnMut(&HistoryChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, change: HistoryChange) {
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(&change);
        }
    }

    fn push_entry(&mut self, entry: Entry) {
        self.undo.push(entry);
        if let Some(limit) = self.limit {
            let excess = self.undo.len().saturating_sub(limit);
            if excess > 0 {
                self.undo.drain(..excess);
            }
        }
    }

    /// Apply `command` and record it.
    pub fn execute(&mut self, store: &mut AnnotationStore, mut command: Command) {
        let target = command.target();
        let applied = command.forward(store);
        if command.flags().contains(CommandFlags::SELECT_ON_EXECUTION) && applied {
            self.last_selection = Some(target);
        }
        if !command.flags().contains(CommandFlags::ADD_TO_HISTORY) {
            trace!(%target, applied, "applied without history");
            self.notify(HistoryChange::Executed { target });
            return;
        }
        self.redo.clear();

        let merged = match &mut self.group {
            Some(group) => group
                .commands
                .last_mut()
                .is_some_and(|prev| prev.merge_in_group(&command))
                .then(|| group.commands.last().is_some_and(Command::is_identity)),
            None => match self.undo.last_mut() {
                Some(entry) if entry.len() == 1 => entry
                    .last_mut()
                    .is_some_and(|prev| prev.merge(&command))
                    .then(|| entry.last().is_some_and(Command::is_identity)),
                _ => None,
            },
        };
        if merged.is_some() {
            trace!(%target, "merged into previous command");
        }

        match (merged, &mut self.group) {
            (Some(true), Some(group)) => {
                trace!(%target, "merged command is a no-op; dropped");
                group.commands.pop();
            }
            (Some(true), None) => {
                trace!(%target, "merged command is a no-op; dropped");
                self.undo.pop();
            }
            (Some(false), _) => {}
            (None, _) if command.is_identity() => {
                trace!(%target, "no-op command discarded");
            }
            (None, Some(group)) => group.commands.push(command),
            (None, None) => {
                debug!(%target, "recorded command");
                self.push_entry(vec![command]);
            }
        }
        self.notify(HistoryChange::Executed { target });
    }

    /// Revert the most recent step. Cancels an open group instead, if there is one.
    pub fn undo(&mut self, store: &mut AnnotationStore) -> bool {
        if self.group.is_some() {
            self.cancel_group(store);
            return true;
        }
        let Some(mut entry) = self.undo.pop() else {
            return false;
        };
        for command in entry.iter_mut().rev() {
            command.inverse(store);
        }
        debug!(commands = entry.len(), "undo");
        self.redo.push(entry);
        self.notify(HistoryChange::Undone);
        true
    }

    /// Re-apply the most recently undone step.
    pub fn redo(&mut self, store: &mut AnnotationStore) -> bool {
        if self.group.is_some() {
            return false;
        }
        let Some(mut entry) = self.redo.pop() else {
            return false;
        };
        for command in &mut entry {
            if command.forward(store)
                && command.flags().contains(CommandFlags::SELECT_ON_EXECUTION)
            {
                self.last_selection = Some(command.target());
            }
        }
        debug!(commands = entry.len(), "redo");
        self.undo.push(entry);
        self.notify(HistoryChange::Redone);
        true
    }

    /// Start (or nest) an action group.
    pub fn begin_group(&mut self) {
        let group = self.group.get_or_insert_with(OpenGroup::default);
        group.depth += 1;
        debug!(depth = group.depth, "begin action group");
    }

    /// Close one nesting level; the outermost close records the group as one step.
    ///
    /// An empty group records nothing.
    pub fn close_group(&mut self) {
        let Some(group) = &mut self.group else {
            return;
        };
        group.depth = group.depth.saturating_sub(1);
        if group.depth > 0 {
            return;
        }
        let commands = self
            .group
            .take()
            .map(|group| group.commands)
            .unwrap_or_default();
        debug!(commands = commands.len(), "close action group");
        if !commands.is_empty() {
            self.push_entry(commands);
        }
        self.notify(HistoryChange::GroupClosed);
    }

    /// Revert and discard every command of the open group, at every nesting level.
    pub fn cancel_group(&mut self, store: &mut AnnotationStore) {
        let Some(mut group) = self.group.take() else {
            return;
        };
        for command in group.commands.iter_mut().rev() {
            command.inverse(store);
        }
        debug!(commands = group.commands.len(), "cancel action group");
        self.notify(HistoryChange::GroupCancelled);
    }

    /// Whether an action group is open.
    pub fn in_group(&self) -> bool {
        self.group.is_some()
    }

    /// Commands recorded so far in the open group, after merging.
    pub fn group_len(&self) -> usize {
        self.group.as_ref().map_or(0, |group| group.commands.len())
    }

    /// Whether there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || self.group.is_some()
    }

    /// Whether there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty() && self.group.is_none()
    }

    /// Number of recorded undo steps.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Forget all history. The open group, if any, is dropped without reverting it.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.group = None;
        self.last_selection = None;
        self.notify(HistoryChange::Cleared);
    }

    /// Incremented by every log-mutating operation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Target of the last applied command flagged
    /// [`SELECT_ON_EXECUTION`](CommandFlags::SELECT_ON_EXECUTION).
    pub fn last_selection(&self) -> Option<AnnotationId> {
        self.last_selection
    }

    /// Like [`last_selection`](Self::last_selection), but forgets it.
    pub fn take_last_selection(&mut self) -> Option<AnnotationId> {
        self.last_selection.take()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::Change;
    use kurbo::Point;
    use markup_model::{Annotation, AnnotationKind, EPSILON, PointFrame, Segment};

    fn circle(store: &mut AnnotationStore) -> Annotation {
        let id = store.allocate_id();
        let mut a = Annotation::new(id, AnnotationKind::Circle);
        a.set_size(Point::new(10.0, 10.0), 20.0, 20.0);
        a
    }

    #[test]
    fn create_then_delete_undoes_to_prior_state() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let existing = circle(&mut store);
        log.execute(&mut store, Command::create(existing));
        let before = store.clone();

        let fresh = circle(&mut store);
        let id = fresh.id();
        log.execute(&mut store, Command::create(fresh));
        log.execute(&mut store, Command::delete(id));
        assert!(!store.contains(id));

        assert!(log.undo(&mut store));
        assert!(store.contains(id));
        assert!(log.undo(&mut store));
        assert!(store.approx_eq(&before, EPSILON));

        assert!(log.redo(&mut store));
        assert!(log.redo(&mut store));
        assert!(!store.contains(id));
    }

    #[test]
    fn consecutive_sets_merge_into_one_step() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let a = circle(&mut store);
        let id = a.id();
        log.execute(&mut store, Command::create(a));
        log.execute(&mut store, Command::set(id, Change::Position(Point::new(30.0, 0.0))));
        log.execute(&mut store, Command::set(id, Change::Position(Point::new(60.0, 5.0))));
        assert_eq!(log.undo_len(), 2);
        assert_eq!(
            store.get(id).map(Annotation::position),
            Some(Point::new(60.0, 5.0))
        );
        log.undo(&mut store);
        assert_eq!(
            store.get(id).map(Annotation::position),
            Some(Point::new(10.0, 10.0))
        );
    }

    #[test]
    fn no_op_sets_leave_no_history() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let a = circle(&mut store);
        let id = a.id();
        log.execute(&mut store, Command::create(a));
        log.execute(&mut store, Command::set(id, Change::Position(Point::new(10.0, 10.0))));
        assert_eq!(log.undo_len(), 1);

        // Moving away and back again merges into a no-op and vanishes.
        log.execute(&mut store, Command::set(id, Change::Rotation(0.5)));
        log.execute(&mut store, Command::set(id, Change::Rotation(0.0)));
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn fresh_execute_clears_redo() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let a = circle(&mut store);
        let id = a.id();
        log.execute(&mut store, Command::create(a));
        log.execute(&mut store, Command::set(id, Change::Rotation(1.0)));
        log.undo(&mut store);
        assert!(log.can_redo());
        log.execute(&mut store, Command::set(id, Change::Rotation(2.0)));
        assert!(!log.can_redo());
    }

    #[test]
    fn group_is_one_step_and_cancel_rolls_back() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let a = circle(&mut store);
        let id = a.id();

        log.begin_group();
        log.execute(&mut store, Command::create(a));
        log.begin_group();
        log.execute(&mut store, Command::set(id, Change::Rotation(1.0)));
        log.close_group();
        assert!(log.in_group());
        log.execute(&mut store, Command::set(id, Change::Rotation(1.5)));
        log.close_group();
        assert_eq!(log.undo_len(), 1);
        log.undo(&mut store);
        assert!(store.is_empty());
        log.redo(&mut store);
        assert_eq!(store.get(id).map(Annotation::rotation), Some(1.5));

        let b = circle(&mut store);
        let b_id = b.id();
        log.begin_group();
        log.execute(&mut store, Command::create(b));
        log.execute(&mut store, Command::set(b_id, Change::Rotation(1.0)));
        log.cancel_group(&mut store);
        assert!(!store.contains(b_id));
        assert!(!log.in_group());
        assert_eq!(log.undo_len(), 1);

        log.begin_group();
        log.close_group();
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn point_sets_coalesce_only_within_the_open_group() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let id = store.allocate_id();
        let line = |x: f64| PointFrame::from_absolute(&[Point::ZERO, Point::new(x, 10.0)]);

        log.begin_group();
        log.execute(&mut store, Command::create(Annotation::new(id, AnnotationKind::Polyline)));
        for i in 1..=100_u32 {
            log.execute(&mut store, Command::set(id, Change::Points(line(f64::from(i)))));
        }
        assert_eq!(log.group_len(), 2);
        log.execute(&mut store, Command::set(id, Change::Closed(true)));
        assert_eq!(log.group_len(), 3);
        log.close_group();
        assert_eq!(log.group_len(), 0);
        assert_eq!(log.undo_len(), 1);

        log.execute(&mut store, Command::set(id, Change::Points(line(5.0))));
        log.execute(&mut store, Command::set(id, Change::Points(line(6.0))));
        assert_eq!(log.undo_len(), 3);

        log.undo(&mut store);
        log.undo(&mut store);
        let restored = store.get(id).map(Annotation::absolute_points).expect("live");
        assert!((restored[1] - Point::new(100.0, 10.0)).hypot() < EPSILON);
        log.undo(&mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn listeners_hear_every_mutation() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        log.on_change(move |change| sink.borrow_mut().push(*change));

        let a = circle(&mut store);
        let id = a.id();
        log.execute(&mut store, Command::create(a).selecting());
        log.undo(&mut store);
        log.redo(&mut store);
        log.clear();
        assert_eq!(
            *seen.borrow(),
            vec![
                HistoryChange::Executed { target: id },
                HistoryChange::Undone,
                HistoryChange::Redone,
                HistoryChange::Cleared,
            ]
        );
        assert_eq!(log.revision(), 4);
        assert_eq!(log.last_selection(), None);
    }

    #[test]
    fn limit_drops_oldest_steps() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::with_limit(Some(2));
        for _ in 0..3 {
            let a = circle(&mut store);
            log.execute(&mut store, Command::create(a));
        }
        assert_eq!(log.undo_len(), 2);
    }

    #[test]
    fn arrow_created_by_command_has_endpoint_extent() {
        let mut store = AnnotationStore::new();
        let mut log = ActionLog::new();
        let id = store.allocate_id();
        log.begin_group();
        log.execute(
            &mut store,
            Command::create(Annotation::new(id, AnnotationKind::Arrow)).selecting(),
        );
        log.execute(
            &mut store,
            Command::set(id, Change::Segment(Segment::new((0.0, 0.0), (50.0, -20.0)))),
        );
        log.execute(
            &mut store,
            Command::set(id, Change::Segment(Segment::new((0.0, 0.0), (100.0, -50.0)))),
        );
        log.close_group();
        let arrow = store.get(id).expect("arrow is live");
        assert!((arrow.size().width - 100.0_f64.hypot(50.0)).abs() < EPSILON);
        assert_eq!(log.last_selection(), Some(id));

        let back = Annotation::from_attributes(&arrow.to_attributes()).expect("valid metadata");
        let seg = back.segment().expect("segment kind");
        assert!(seg.approx_eq(&Segment::new((0.0, 0.0), (100.0, -50.0)), EPSILON));
        assert!((back.rotation() - arrow.rotation()).abs() < EPSILON);
    }
}
