// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interactive edit session.

use core::{fmt, mem};

use kurbo::{Affine, BezPath, Line, Point};
use markup_history::{
    ActionLog, AnnotationStore, Change, Command, DocumentError, LoadReport, load_document,
    save_document,
};
use markup_hit::{
    HitParams, IdBuffer, PreciseHitTest, ProbeShape, ProbeTarget, Quad, StrokedPolyline,
    pick_annotation,
};
use markup_model::{
    AffineViewport, Annotation, AnnotationFlags, AnnotationId, AnnotationKind, CoordinateTransform,
    EditFamily, Frame, ScenePoint, StyleAttr, StyleValue,
};
use markup_path::{cloud_outline, cloud_rect, polyline_path};
use tracing::{debug, trace, warn};

use crate::mode::{EditContext, EditMode, Gesture, ModeOutcome, ModeRegistry};
use crate::{
    Button, ClickCounter, HeadlessTextInput, InputArbitration, PointerEvent, PointerKind,
    SessionConfig, TextAccepted, TextInput,
};

/// A selected annotation being dragged.
#[derive(Clone, Copy, Debug)]
struct Drag {
    id: AnnotationId,
    origin_position: Point,
    origin_pointer: Point,
}

#[derive(Debug)]
enum State {
    Idle,
    Creating(Gesture),
    DraggingSelection(Drag),
    EditingText(Gesture),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Creating(_) => "creating",
            Self::DraggingSelection(_) => "dragging",
            Self::EditingText(_) => "editing-text",
        }
    }

    fn kind(&self) -> Option<AnnotationKind> {
        match self {
            Self::Creating(gesture) | Self::EditingText(gesture) => Some(gesture.kind()),
            Self::Idle | Self::DraggingSelection(_) => None,
        }
    }
}

/// Public view of the session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for input.
    Idle,
    /// A creation gesture is in progress.
    Creating {
        /// The annotation being created.
        id: AnnotationId,
        /// Its kind.
        kind: AnnotationKind,
    },
    /// The selected annotation follows the pointer.
    DraggingSelection {
        /// The dragged annotation.
        id: AnnotationId,
    },
    /// The inline text editor is open.
    EditingText {
        /// The annotation being edited.
        id: AnnotationId,
    },
}

/// Translates pointer input into [`ActionLog`] operations, one annotation at a time.
///
/// The session owns the live annotations, their history, and every piece of interaction state:
///
/// - With a tool set, a press on empty canvas creates an annotation of that kind through the
///   kind's [`EditMode`]. The whole gesture is one action group, so it undoes as one step and
///   a failed gesture (too small, cancelled) rolls back without a trace.
/// - A press on the selected annotation drags it; a double-click on a selected text, stamp,
///   or dimension reopens the text editor.
/// - Without a tool, a press selects what is under the pointer.
///
/// At most one annotation is being created, dragged, or edited at a time.
pub struct EditSession<T: CoordinateTransform = AffineViewport> {
    config: SessionConfig,
    transform: T,
    store: AnnotationStore,
    log: ActionLog,
    modes: ModeRegistry,
    arbitration: InputArbitration,
    clicks: ClickCounter,
    text_input: Box<dyn TextInput>,
    tool: Option<AnnotationKind>,
    state: State,
    selected: Option<AnnotationId>,
    hovered: Option<AnnotationId>,
}

impl<T: CoordinateTransform> fmt::Debug for EditSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("state", &self.state)
            .field("tool", &self.tool)
            .field("selected", &self.selected)
            .field("hovered", &self.hovered)
            .field("annotations", &self.store.len())
            .field("log", &self.log)
            .field("text_input", &self.text_input)
            .finish_non_exhaustive()
    }
}

impl<T: CoordinateTransform> EditSession<T> {
    /// A session over `transform` with a headless text editor and the default modes.
    pub fn new(transform: T, config: SessionConfig) -> Self {
        Self {
            store: AnnotationStore::new(),
            log: ActionLog::with_limit(config.history_limit),
            modes: ModeRegistry::with_defaults(),
            arbitration: InputArbitration::new(),
            clicks: ClickCounter::with_thresholds(
                Some(config.double_click_distance_px),
                Some(config.double_click_time_ms),
            ),
            text_input: Box::new(HeadlessTextInput::default()),
            tool: None,
            state: State::Idle,
            selected: None,
            hovered: None,
            config,
            transform,
        }
    }

    /// Use `text_input` as the inline text editor.
    pub fn with_text_input(mut self, text_input: Box<dyn TextInput>) -> Self {
        self.text_input = text_input;
        self
    }

    /// Replace the kind → mode registry.
    pub fn with_modes(mut self, modes: ModeRegistry) -> Self {
        self.modes = modes;
        self
    }

    /// Session tunables.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The coordinate transform.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// The coordinate transform, for pan and zoom.
    pub fn transform_mut(&mut self) -> &mut T {
        &mut self.transform
    }

    /// Live annotations.
    pub fn annotations(&self) -> &AnnotationStore {
        &self.store
    }

    /// The undo log.
    pub fn history(&self) -> &ActionLog {
        &self.log
    }

    /// The undo log, to register listeners.
    pub fn history_mut(&mut self) -> &mut ActionLog {
        &mut self.log
    }

    /// The inline text editor.
    pub fn text_input(&self) -> &dyn TextInput {
        self.text_input.as_ref()
    }

    /// The kind new annotations are created as, if any.
    pub fn tool(&self) -> Option<AnnotationKind> {
        self.tool
    }

    /// The annotation under the pointer.
    pub fn hovered(&self) -> Option<AnnotationId> {
        self.hovered
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        match &self.state {
            State::Idle => SessionState::Idle,
            State::Creating(gesture) => SessionState::Creating {
                id: gesture.id(),
                kind: gesture.kind(),
            },
            State::DraggingSelection(drag) => SessionState::DraggingSelection { id: drag.id },
            State::EditingText(gesture) => SessionState::EditingText { id: gesture.id() },
        }
    }

    /// Pick the kind to create, or `None` to select and move only.
    ///
    /// Any gesture in progress is cancelled and the selection cleared.
    pub fn set_tool(&mut self, tool: Option<AnnotationKind>) {
        self.cancel();
        self.deselect();
        self.tool = tool;
        debug!(tool = tool.map(AnnotationKind::name), "tool changed");
    }

    fn enter(&mut self, from: &'static str, next: State) {
        debug!(
            from,
            to = next.name(),
            kind = next.kind().map(AnnotationKind::name),
            "session state"
        );
        self.state = next;
    }

    /// Run `f` with the mode for `kind` and a context over the session's state.
    fn with_mode<R>(
        &mut self,
        kind: AnnotationKind,
        f: impl FnOnce(&dyn EditMode, &mut EditContext<'_>) -> R,
    ) -> Option<R> {
        let mode = self.modes.get(kind)?;
        let mut cx = EditContext {
            store: &mut self.store,
            log: &mut self.log,
            transform: &self.transform,
            config: &self.config,
        };
        Some(f(mode, &mut cx))
    }

    fn drive(
        &mut self,
        gesture: &mut Gesture,
        f: impl FnOnce(&dyn EditMode, &mut Gesture, &mut EditContext<'_>) -> ModeOutcome,
    ) -> ModeOutcome {
        self.with_mode(gesture.kind(), |mode, cx| f(mode, gesture, cx))
            .unwrap_or(ModeOutcome::Cancel)
    }

    fn resolve(&mut self, gesture: Gesture, outcome: ModeOutcome) {
        match outcome {
            ModeOutcome::Continue => self.state = State::Creating(gesture),
            ModeOutcome::Finish => {
                self.log.close_group();
                let id = gesture.id();
                self.enter("creating", State::Idle);
                self.mark_selected(Some(id));
            }
            ModeOutcome::Cancel => {
                self.log.cancel_group(&mut self.store);
                self.clicks.clear();
                self.enter("creating", State::Idle);
                self.sync_flags();
            }
            ModeOutcome::EditText => self.open_editor("creating", gesture),
        }
    }

    fn open_editor(&mut self, from: &'static str, gesture: Gesture) {
        let Some(annotation) = self.store.get(gesture.id()) else {
            self.log.cancel_group(&mut self.store);
            self.enter(from, State::Idle);
            return;
        };
        let quad = annotation.generate_bounding_polygon(&self.transform);
        self.text_input.open(gesture.id(), quad, annotation.text());
        self.enter(from, State::EditingText(gesture));
    }

    /// A press.
    pub fn pointer_down(&mut self, event: PointerEvent) {
        if !self.arbitration.accepts(&event) {
            trace!(position = ?event.position, "mouse press ignored after touch");
            return;
        }
        if event.pointer == PointerKind::Touch {
            self.arbitration.disable_mouse();
        }
        let count = self
            .clicks
            .on_down(event.pointer, event.button, event.position, event.time_ms);
        let at = event.position;
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(mut gesture) => {
                let outcome = match event.button {
                    Button::Secondary => {
                        self.drive(&mut gesture, |mode, g, cx| mode.delete_last_vertex(g, cx))
                    }
                    Button::Primary if count >= 2 => {
                        self.drive(&mut gesture, |mode, g, cx| mode.double_click(g, cx, at))
                    }
                    Button::Primary => {
                        self.drive(&mut gesture, |mode, g, cx| mode.pointer_down(g, cx, at))
                    }
                    Button::Auxiliary => ModeOutcome::Continue,
                };
                self.resolve(gesture, outcome);
            }
            State::Idle if event.button == Button::Primary => self.idle_press(at, count),
            // The text editor owns input while it is open.
            other => self.state = other,
        }
    }

    fn idle_press(&mut self, at: Point, count: u32) {
        let hit = self.pick(at);
        if let Some(id) = hit
            && self.selected == Some(id)
        {
            let reopen = count >= 2
                && self
                    .store
                    .get(id)
                    .is_some_and(|a| a.kind().uses_text_editing());
            if reopen {
                self.begin_text_edit(id);
            } else {
                self.begin_drag(id, at);
            }
            return;
        }
        if let Some(kind) = self.tool {
            if self.selected.is_some() {
                self.deselect();
            } else {
                self.begin_creation(kind, at);
            }
            return;
        }
        match hit {
            Some(id) => {
                self.select(id);
            }
            None => self.deselect(),
        }
    }

    fn begin_creation(&mut self, kind: AnnotationKind, at: Point) {
        self.log.begin_group();
        let begun = self.with_mode(kind, |mode, cx| {
            (mode.begin(cx, kind, at), mode.press_outcome())
        });
        match begun {
            Some((gesture, ModeOutcome::EditText)) => self.open_editor("idle", gesture),
            Some((gesture, _)) => self.enter("idle", State::Creating(gesture)),
            None => {
                warn!(kind = kind.name(), "no edit mode registered");
                self.log.cancel_group(&mut self.store);
            }
        }
    }

    fn begin_drag(&mut self, id: AnnotationId, at: Point) {
        let Some(annotation) = self.store.get(id) else {
            return;
        };
        let drag = Drag {
            id,
            origin_position: annotation.position(),
            origin_pointer: self.transform.screen_to_annotation(at),
        };
        self.log.begin_group();
        self.enter("idle", State::DraggingSelection(drag));
    }

    /// Pointer travel, with or without a button held.
    pub fn pointer_move(&mut self, event: PointerEvent) {
        if !self.arbitration.accepts(&event) {
            return;
        }
        self.clicks.on_move(event.pointer, event.position);
        let at = event.position;
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(mut gesture) => {
                let outcome =
                    self.drive(&mut gesture, |mode, g, cx| mode.pointer_move(g, cx, at));
                self.resolve(gesture, outcome);
            }
            State::DraggingSelection(drag) => {
                let pointer = self.transform.screen_to_annotation(at);
                let position = drag.origin_position + (pointer - drag.origin_pointer);
                self.log.execute(
                    &mut self.store,
                    Command::set(drag.id, Change::Position(position)),
                );
                self.state = State::DraggingSelection(drag);
            }
            State::Idle => self.hover(at),
            other => self.state = other,
        }
    }

    /// A release.
    pub fn pointer_up(&mut self, event: PointerEvent) {
        if !self.arbitration.accepts(&event) {
            return;
        }
        if event.pointer == PointerKind::Touch {
            self.arbitration
                .schedule_mouse_enable(event.time_ms, self.config.touch_reenable_delay_ms);
        }
        self.clicks
            .on_up(event.pointer, event.button, event.position);
        let at = event.position;
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(mut gesture) if event.button == Button::Primary => {
                let outcome = self.drive(&mut gesture, |mode, g, cx| mode.pointer_up(g, cx, at));
                self.resolve(gesture, outcome);
            }
            State::DraggingSelection(_) => {
                self.log.close_group();
                self.enter("dragging", State::Idle);
            }
            other => self.state = other,
        }
    }

    /// A double-click reported by the host rather than detected from presses.
    pub fn double_click(&mut self, event: PointerEvent) {
        if !self.arbitration.accepts(&event) {
            return;
        }
        let at = event.position;
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(mut gesture) => {
                let outcome =
                    self.drive(&mut gesture, |mode, g, cx| mode.double_click(g, cx, at));
                self.resolve(gesture, outcome);
            }
            State::Idle => {
                if let Some(id) = self.pick(at)
                    && self.selected == Some(id)
                {
                    self.begin_text_edit(id);
                }
            }
            other => self.state = other,
        }
    }

    /// Drop the most recent vertex of a multi-click creation.
    pub fn delete_last_vertex(&mut self) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(mut gesture) => {
                let outcome =
                    self.drive(&mut gesture, |mode, g, cx| mode.delete_last_vertex(g, cx));
                self.resolve(gesture, outcome);
            }
            other => self.state = other,
        }
    }

    /// Abandon whatever is in progress and roll back its action group.
    pub fn cancel(&mut self) {
        let previous = mem::replace(&mut self.state, State::Idle);
        self.log.cancel_group(&mut self.store);
        if self.text_input.is_open() {
            self.text_input.close();
        }
        self.clicks.clear();
        if !matches!(previous, State::Idle) {
            debug!(
                from = previous.name(),
                to = "idle",
                kind = previous.kind().map(AnnotationKind::name),
                "session cancelled"
            );
        }
        self.sync_flags();
    }

    /// The host switched to pan/zoom navigation.
    pub fn enter_navigation_mode(&mut self) {
        self.cancel();
        self.deselect();
    }

    /// The host is about to save.
    pub fn notify_save(&mut self) {
        self.cancel();
    }

    /// Reopen the text editor over `id`. Returns `false` if `id` does not hold text.
    pub fn begin_text_edit(&mut self, id: AnnotationId) -> bool {
        if !matches!(self.state, State::Idle) {
            self.cancel();
        }
        let Some(annotation) = self.store.get(id) else {
            return false;
        };
        if !annotation.kind().uses_text_editing() {
            return false;
        }
        let at = self.transform.annotation_to_screen(annotation.position());
        let gesture = Gesture::existing(annotation, at);
        self.mark_selected(Some(id));
        self.log.begin_group();
        self.open_editor("idle", gesture);
        true
    }

    /// Commit the inline editor.
    ///
    /// Empty text deletes a text or stamp annotation and clears a dimension's label.
    pub fn accept_text(&mut self, accepted: TextAccepted) {
        let gesture = match mem::replace(&mut self.state, State::Idle) {
            State::EditingText(gesture) => gesture,
            other => {
                self.state = other;
                warn!("text accepted with no open editor");
                return;
            }
        };
        self.text_input.close();
        let id = gesture.id();
        let kind = gesture.kind();

        if accepted.is_empty() && kind != AnnotationKind::Dimension {
            if gesture.created() {
                self.log.cancel_group(&mut self.store);
            } else {
                self.log.execute(&mut self.store, Command::delete(id));
                self.log.close_group();
            }
            self.enter("editing-text", State::Idle);
            self.sync_flags();
            return;
        }

        let resize = accepted
            .size
            .zip(self.store.get(id))
            .and_then(|(size, annotation)| {
                let top_left = annotation.local_bounding_polygon()[0];
                let position = Affine::translate(top_left.to_vec2())
                    * Affine::rotate(annotation.rotation())
                    * Point::new(size.width / 2.0, size.height / 2.0);
                match kind {
                    AnnotationKind::Text => Some(Change::Frame(Frame { position, size })),
                    AnnotationKind::Stamp => Some(Change::StampSize { position, size }),
                    _ => None,
                }
            });
        if let Some(change) = resize {
            self.log.execute(&mut self.store, Command::set(id, change));
        }
        let text = (!accepted.is_empty()).then_some(accepted.text);
        self.log
            .execute(&mut self.store, Command::set(id, Change::Text(text)));
        if let Some(style) = accepted.style {
            self.log
                .execute(&mut self.store, Command::set(id, Change::Style(style)));
        }
        self.log.close_group();
        self.enter("editing-text", State::Idle);
        self.mark_selected(Some(id));
    }

    /// The selected annotation.
    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected.filter(|id| self.store.contains(*id))
    }

    /// Select `id`, deselecting the previous selection first. Returns `false` if `id` is not
    /// live.
    pub fn select(&mut self, id: AnnotationId) -> bool {
        if self.selected == Some(id) && matches!(self.state, State::Idle) {
            return self.store.contains(id);
        }
        self.deselect();
        if !self.store.contains(id) {
            return false;
        }
        self.mark_selected(Some(id));
        true
    }

    /// Clear the selection.
    ///
    /// A creation in progress is finished if it is valid so far and cancelled otherwise; an
    /// open text edit is cancelled.
    pub fn deselect(&mut self) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Creating(gesture) => {
                let valid = self
                    .with_mode(gesture.kind(), |mode, cx| mode.is_valid(&gesture, cx))
                    .unwrap_or(false);
                if valid {
                    self.log.close_group();
                    self.enter("creating", State::Idle);
                } else {
                    self.state = State::Creating(gesture);
                    self.cancel();
                }
            }
            State::DraggingSelection(_) => {
                self.log.close_group();
                self.enter("dragging", State::Idle);
            }
            state @ State::EditingText(_) => {
                self.state = state;
                self.cancel();
            }
            State::Idle => {}
        }
        self.mark_selected(None);
    }

    fn mark_selected(&mut self, id: Option<AnnotationId>) {
        self.selected = id;
        self.sync_flags();
    }

    /// Make the `SELECTED` and `HIGHLIGHTED` flags match the session.
    fn sync_flags(&mut self) {
        if self.selected.is_some_and(|id| !self.store.contains(id)) {
            self.selected = None;
        }
        if self.hovered.is_some_and(|id| !self.store.contains(id)) {
            self.hovered = None;
        }
        let (selected, hovered) = (self.selected, self.hovered);
        for id in self.store.ids().to_vec() {
            if let Some(annotation) = self.store.get_mut(id) {
                annotation.set_flags(AnnotationFlags::SELECTED, selected == Some(id));
                annotation.set_flags(AnnotationFlags::HIGHLIGHTED, hovered == Some(id));
            }
        }
    }

    fn hover(&mut self, at: Point) {
        let hit = self.pick(at);
        if hit != self.hovered {
            trace!(hovered = ?hit, "pointer over");
            self.hovered = hit;
            self.sync_flags();
        }
    }

    /// Delete the selection. Returns `false` if nothing is selected.
    pub fn delete_selected(&mut self) -> bool {
        if !matches!(self.state, State::Idle) {
            self.cancel();
        }
        let Some(id) = self.selected() else {
            return false;
        };
        self.mark_selected(None);
        self.log.execute(&mut self.store, Command::delete(id));
        self.sync_flags();
        true
    }

    /// Set one style attribute of the selection. Returns `false` if nothing is selected or the
    /// kind does not take `attr`.
    pub fn set_style(&mut self, attr: StyleAttr, value: StyleValue) -> bool {
        let Some(mut style) = self
            .selected()
            .and_then(|id| self.store.get(id))
            .map(|a| a.style().clone())
        else {
            return false;
        };
        if !style.set(attr, value) {
            return false;
        }
        if let Some(id) = self.selected {
            self.log
                .execute(&mut self.store, Command::set(id, Change::Style(style)));
        }
        true
    }

    /// Rotate the selection by `delta` radians. Consecutive rotations undo as one step.
    pub fn rotate_selected(&mut self, delta: f64) -> bool {
        let Some((id, rotation)) = self
            .selected()
            .and_then(|id| self.store.get(id))
            .map(|a| (a.id(), a.rotation()))
        else {
            return false;
        };
        self.log.execute(
            &mut self.store,
            Command::set(id, Change::Rotation(rotation + delta)),
        );
        true
    }

    /// Undo one step. A gesture in progress is cancelled instead.
    pub fn undo(&mut self) -> bool {
        if !matches!(self.state, State::Idle) {
            self.cancel();
            return true;
        }
        let undone = self.log.undo(&mut self.store);
        self.sync_flags();
        undone
    }

    /// Redo one step, selecting what it creates.
    pub fn redo(&mut self) -> bool {
        if !matches!(self.state, State::Idle) {
            self.cancel();
        }
        self.log.take_last_selection();
        let redone = self.log.redo(&mut self.store);
        match self.log.take_last_selection() {
            Some(id) if self.store.contains(id) => self.mark_selected(Some(id)),
            _ => self.sync_flags(),
        }
        redone
    }

    /// The annotation under the screen point `at`, topmost first.
    pub fn pick(&self, at: Point) -> Option<AnnotationId> {
        let p = self.transform.screen_to_annotation(at);
        let scale = self.transform.screen_scale();
        let pixel = if scale > 0.0 { scale.recip() } else { 1.0 };
        let params = HitParams {
            fill_tolerance: pixel,
            stroke_tolerance: pixel,
        };
        let shapes: Vec<(AnnotationId, Box<dyn PreciseHitTest>)> = self
            .store
            .iter_top_down()
            .filter(|a| !a.flags().contains(AnnotationFlags::HIDDEN))
            .map(|a| (a.id(), self.hit_shape(a)))
            .collect();
        pick_annotation(
            shapes
                .iter()
                .map(|(id, shape)| (*id, &**shape as &dyn PreciseHitTest)),
            p,
            &params,
        )
        .map(|(id, _)| id)
    }

    fn hit_shape(&self, annotation: &Annotation) -> Box<dyn PreciseHitTest> {
        let half_width =
            annotation.style().stroke_width() * self.config.stroke_pick_margin / 2.0;
        match annotation.kind().edit_family() {
            EditFamily::Segment | EditFamily::Stroke | EditFamily::MultiClick => {
                Box::new(StrokedPolyline {
                    points: annotation.absolute_points(),
                    closed: annotation.is_closed(),
                    half_width,
                })
            }
            EditFamily::Drag | EditFamily::Text => {
                Box::new(Quad(annotation.local_bounding_polygon()))
            }
        }
    }

    fn probe_target(&self, annotation: &Annotation) -> ProbeTarget {
        let to_screen = |p: Point| self.transform.annotation_to_screen(p);
        let shape = match annotation.kind().edit_family() {
            EditFamily::Segment => annotation.segment().map_or(ProbeShape::Frame, |s| {
                ProbeShape::Segment(Line::new(to_screen(s.tail), to_screen(s.head)))
            }),
            EditFamily::Stroke | EditFamily::MultiClick => ProbeShape::Path {
                points: annotation
                    .absolute_points()
                    .into_iter()
                    .map(to_screen)
                    .collect(),
                closed: annotation.is_closed(),
            },
            EditFamily::Drag | EditFamily::Text => ProbeShape::Frame,
        };
        ProbeTarget {
            shape,
            quad: annotation.generate_bounding_polygon(&self.transform),
        }
    }

    /// Recover the scene point under the rendered silhouette of `id`.
    ///
    /// `buffer` is the id-buffer the host rendered `id` into, at device resolution. `None`
    /// means no point can be resolved this frame.
    pub fn scene_point_at(&self, id: AnnotationId, buffer: &IdBuffer<'_>) -> Option<ScenePoint> {
        let annotation = self.store.get(id)?;
        self.probe_target(annotation).recover_scene_point(
            buffer,
            self.transform.device_pixel_ratio(),
            |p| self.transform.screen_to_scene(p),
        )
    }

    /// The outline of a path-drawn kind in annotation space.
    ///
    /// Clouds and polyclouds get their bumpy outline; polylines and strokes a plain path.
    /// Other kinds are drawn from their frame and return `None`.
    pub fn outline(&self, id: AnnotationId) -> Option<BezPath> {
        let annotation = self.store.get(id)?;
        let params = self.config.cloud_params();
        match annotation.kind() {
            AnnotationKind::Cloud => {
                let mut path = cloud_rect(annotation.size(), &params);
                path.apply_affine(annotation.local_transform());
                Some(path)
            }
            AnnotationKind::Polycloud => Some(cloud_outline(
                &annotation.absolute_points(),
                annotation.is_closed(),
                &params,
            )),
            AnnotationKind::Polyline | AnnotationKind::Freehand | AnnotationKind::Highlight => {
                Some(polyline_path(
                    &annotation.absolute_points(),
                    annotation.is_closed(),
                ))
            }
            _ => None,
        }
    }

    /// Load a JSON document on top of the current annotations, without recording history.
    pub fn load(&mut self, json: &str) -> Result<LoadReport, DocumentError> {
        self.cancel();
        let report = load_document(json, &mut self.store, &mut self.log)?;
        self.sync_flags();
        Ok(report)
    }

    /// Serialize every live annotation.
    pub fn save(&self) -> Result<String, DocumentError> {
        save_document(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Shape, Size};
    use markup_model::EPSILON;

    fn session() -> EditSession {
        EditSession::new(AffineViewport::identity(), SessionConfig::default())
    }

    fn down(s: &mut EditSession, x: f64, y: f64, t: u64) {
        s.pointer_down(PointerEvent::mouse((x, y), t));
    }

    fn drag(s: &mut EditSession, x: f64, y: f64, t: u64) {
        s.pointer_move(PointerEvent::mouse((x, y), t));
    }

    fn up(s: &mut EditSession, x: f64, y: f64, t: u64) {
        s.pointer_up(PointerEvent::mouse((x, y), t));
    }

    fn only(s: &EditSession) -> &Annotation {
        assert_eq!(s.annotations().len(), 1);
        s.annotations().iter().next().expect("one annotation")
    }

    /// A rectangle dragged out from (10, 10) to (60, 50), centered on (35, 30).
    fn with_rectangle(s: &mut EditSession) -> AnnotationId {
        s.set_tool(Some(AnnotationKind::Rectangle));
        down(s, 10.0, 10.0, 0);
        drag(s, 30.0, 30.0, 10);
        drag(s, 60.0, 50.0, 20);
        up(s, 60.0, 50.0, 30);
        only(s).id()
    }

    #[test]
    fn drag_creation_is_one_undo_step() {
        let mut s = session();
        let id = with_rectangle(&mut s);
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.selected(), Some(id));
        assert!(only(&s).flags().contains(AnnotationFlags::SELECTED));
        assert_eq!(only(&s).size(), Size::new(50.0, 40.0));
        assert_eq!(s.history().undo_len(), 1);

        assert!(s.undo());
        assert!(s.annotations().is_empty());
        assert_eq!(s.selected(), None);
        assert!(s.redo());
        assert_eq!(s.selected(), Some(id));
        assert_eq!(only(&s).position(), Point::new(35.0, 30.0));
    }

    #[test]
    fn tiny_drag_is_rolled_back() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Circle));
        down(&mut s, 10.0, 10.0, 0);
        assert!(matches!(s.state(), SessionState::Creating { .. }));
        up(&mut s, 12.0, 11.0, 10);
        assert!(s.annotations().is_empty());
        assert!(!s.history().can_undo());
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn arrow_extent_is_endpoint_distance_and_survives_save() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Arrow));
        down(&mut s, 0.0, 0.0, 0);
        drag(&mut s, 40.0, -20.0, 10);
        drag(&mut s, 100.0, -50.0, 20);
        up(&mut s, 100.0, -50.0, 30);
        let arrow = only(&s).clone();
        let expected = Point::ZERO.distance(Point::new(100.0, -50.0));
        assert!((arrow.size().width - expected).abs() < EPSILON);

        let json = s.save().expect("serializes");
        let mut restored = session();
        let report = restored.load(&json).expect("loads");
        assert_eq!(report.loaded, vec![arrow.id()]);
        let loaded = only(&restored);
        let (a, b) = (
            arrow.segment().expect("segment"),
            loaded.segment().expect("segment"),
        );
        assert!(a.approx_eq(&b, EPSILON));
        assert!((arrow.rotation() - loaded.rotation()).abs() < EPSILON);
        assert!(!restored.history().can_undo());
    }

    #[test]
    fn polyline_closes_near_first_vertex() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Polyline));
        down(&mut s, 0.0, 0.0, 0);
        up(&mut s, 0.0, 0.0, 5);
        drag(&mut s, 50.0, 0.0, 200);
        down(&mut s, 50.0, 0.0, 500);
        up(&mut s, 50.0, 0.0, 505);
        down(&mut s, 50.0, 50.0, 1000);
        up(&mut s, 50.0, 50.0, 1005);
        assert!(matches!(s.state(), SessionState::Creating { .. }));
        down(&mut s, 3.0, 4.0, 1500);
        assert_eq!(s.state(), SessionState::Idle);
        let line = only(&s);
        assert!(line.is_closed());
        assert_eq!(line.points().len(), 3);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn polyline_pointer_travel_keeps_the_group_small() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Polyline));
        down(&mut s, 0.0, 0.0, 0);
        up(&mut s, 0.0, 0.0, 5);
        for i in 1..=500_u32 {
            drag(&mut s, f64::from(i % 50) + 10.0, f64::from(i % 7), u64::from(i) + 10);
        }
        assert!(s.history().in_group());
        assert_eq!(s.history().group_len(), 2);
        down(&mut s, 80.0, 0.0, 1000);
        up(&mut s, 80.0, 0.0, 1005);
        drag(&mut s, 80.0, 40.0, 1100);
        assert_eq!(s.history().group_len(), 2);
        assert_eq!(only(&s).points().len(), 3);
    }

    #[test]
    fn polyline_double_click_ends_open() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Polyline));
        down(&mut s, 0.0, 0.0, 0);
        up(&mut s, 0.0, 0.0, 5);
        down(&mut s, 60.0, 0.0, 1000);
        up(&mut s, 60.0, 0.0, 1010);
        down(&mut s, 60.0, 0.0, 1100);
        assert_eq!(s.state(), SessionState::Idle);
        let line = only(&s);
        assert!(!line.is_closed());
        assert_eq!(
            line.absolute_points(),
            vec![Point::new(0.0, 0.0), Point::new(60.0, 0.0)]
        );
    }

    #[test]
    fn deleting_every_vertex_cancels() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Polycloud));
        down(&mut s, 0.0, 0.0, 0);
        down(&mut s, 40.0, 0.0, 1000);
        down(&mut s, 40.0, 40.0, 2000);
        s.pointer_down(PointerEvent::mouse((40.0, 40.0), 3000).with_button(Button::Secondary));
        s.pointer_up(PointerEvent::mouse((40.0, 40.0), 3010).with_button(Button::Secondary));
        assert!(matches!(s.state(), SessionState::Creating { .. }));
        assert_eq!(only(&s).points().len(), 3);
        s.delete_last_vertex();
        assert!(matches!(s.state(), SessionState::Creating { .. }));
        s.delete_last_vertex();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.annotations().is_empty());
        assert!(!s.history().can_undo());
    }

    #[test]
    fn freehand_is_simplified_on_release() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Freehand));
        down(&mut s, 0.0, 0.0, 0);
        for i in 1..=20_u32 {
            drag(&mut s, f64::from(i) * 5.0, 0.0, u64::from(i) * 10);
        }
        up(&mut s, 100.0, 0.0, 300);
        let stroke = only(&s);
        assert!(!stroke.flags().contains(AnnotationFlags::ABSOLUTE_POINTS));
        assert_eq!(stroke.points().len(), 2);
        assert_eq!(s.history().undo_len(), 1);
        assert!(s.outline(stroke.id()).is_some());
    }

    #[test]
    fn text_accept_sizes_from_top_left() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Text));
        down(&mut s, 10.0, 20.0, 0);
        let id = only(&s).id();
        assert_eq!(s.state(), SessionState::EditingText { id });
        assert!(s.text_input().is_open());
        up(&mut s, 10.0, 20.0, 5);
        assert_eq!(s.state(), SessionState::EditingText { id });

        s.accept_text(TextAccepted {
            text: "Hello".into(),
            size: Some(Size::new(200.0, 50.0)),
            style: None,
        });
        assert!(!s.text_input().is_open());
        let text = only(&s);
        assert_eq!(text.text(), Some("Hello"));
        assert_eq!(text.size(), Size::new(200.0, 50.0));
        assert!((text.position() - Point::new(110.0, 45.0)).hypot() < EPSILON);
        assert_eq!(s.history().undo_len(), 1);
        s.undo();
        assert!(s.annotations().is_empty());
    }

    #[test]
    fn empty_text_leaves_nothing_behind() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Stamp));
        down(&mut s, 10.0, 20.0, 0);
        up(&mut s, 10.0, 20.0, 5);
        s.accept_text(TextAccepted::text("   "));
        assert!(s.annotations().is_empty());
        assert!(!s.history().can_undo());
    }

    #[test]
    fn double_click_reopens_text_and_empty_accept_deletes() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Text));
        down(&mut s, 10.0, 20.0, 0);
        up(&mut s, 10.0, 20.0, 5);
        s.accept_text(TextAccepted::text("Hi"));
        let id = only(&s).id();
        assert_eq!(s.selected(), Some(id));

        down(&mut s, 20.0, 30.0, 5000);
        up(&mut s, 20.0, 30.0, 5010);
        down(&mut s, 20.0, 30.0, 5100);
        assert_eq!(s.state(), SessionState::EditingText { id });
        s.accept_text(TextAccepted::text(""));
        assert!(s.annotations().is_empty());
        assert_eq!(s.history().undo_len(), 2);
        s.undo();
        assert_eq!(only(&s).text(), Some("Hi"));
    }

    #[test]
    fn dragging_the_selection_merges_into_one_step() {
        let mut s = session();
        let id = with_rectangle(&mut s);
        s.set_tool(None);
        down(&mut s, 35.0, 30.0, 1000);
        up(&mut s, 35.0, 30.0, 1010);
        assert_eq!(s.selected(), Some(id));

        down(&mut s, 35.0, 30.0, 2000);
        assert_eq!(s.state(), SessionState::DraggingSelection { id });
        drag(&mut s, 45.0, 30.0, 2010);
        drag(&mut s, 55.0, 40.0, 2020);
        up(&mut s, 55.0, 40.0, 2030);
        assert_eq!(only(&s).position(), Point::new(55.0, 40.0));
        assert_eq!(s.history().undo_len(), 2);

        s.undo();
        assert_eq!(only(&s).position(), Point::new(35.0, 30.0));
    }

    #[test]
    fn navigation_and_save_cancel_the_gesture() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Rectangle));
        down(&mut s, 10.0, 10.0, 0);
        drag(&mut s, 80.0, 80.0, 10);
        s.enter_navigation_mode();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.annotations().is_empty());
        assert!(!s.history().can_undo());

        s.set_tool(Some(AnnotationKind::Text));
        down(&mut s, 10.0, 10.0, 1000);
        up(&mut s, 10.0, 10.0, 1010);
        s.notify_save();
        assert!(s.annotations().is_empty());
        assert!(!s.text_input().is_open());
    }

    #[test]
    fn deselect_finishes_valid_and_cancels_invalid_creation() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Rectangle));
        down(&mut s, 0.0, 0.0, 0);
        drag(&mut s, 2.0, 2.0, 10);
        s.deselect();
        assert!(s.annotations().is_empty());

        down(&mut s, 0.0, 0.0, 1000);
        drag(&mut s, 50.0, 50.0, 1010);
        s.deselect();
        assert_eq!(s.annotations().len(), 1);
        assert_eq!(s.history().undo_len(), 1);
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn synthetic_mouse_after_touch_is_ignored() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Rectangle));
        s.pointer_down(PointerEvent::touch((10.0, 10.0), 0));
        s.pointer_move(PointerEvent::touch((60.0, 60.0), 50));
        s.pointer_up(PointerEvent::touch((60.0, 60.0), 100));
        let id = only(&s).id();
        assert_eq!(s.selected(), Some(id));

        down(&mut s, 10.0, 10.0, 150);
        assert_eq!(s.selected(), Some(id));
        down(&mut s, 200.0, 200.0, 700);
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn hover_highlights_annotation_under_pointer() {
        let mut s = session();
        let id = with_rectangle(&mut s);
        s.set_tool(None);
        drag(&mut s, 20.0, 20.0, 100);
        assert_eq!(s.hovered(), Some(id));
        assert!(only(&s).flags().contains(AnnotationFlags::HIGHLIGHTED));
        drag(&mut s, 300.0, 300.0, 200);
        assert_eq!(s.hovered(), None);
        assert!(!only(&s).flags().contains(AnnotationFlags::HIGHLIGHTED));
    }

    #[test]
    fn selection_edits_record_history() {
        let mut s = session();
        let id = with_rectangle(&mut s);
        assert!(s.rotate_selected(0.1));
        assert!(s.rotate_selected(0.1));
        assert!((only(&s).rotation() - 0.2).abs() < EPSILON);
        assert_eq!(s.history().undo_len(), 2);
        assert!(s.set_style(StyleAttr::StrokeWidth, StyleValue::Number(4.0)));
        assert!((only(&s).style().stroke_width() - 4.0).abs() < EPSILON);

        assert!(s.delete_selected());
        assert!(s.annotations().is_empty());
        assert!(!s.delete_selected());
        s.undo();
        assert_eq!(only(&s).id(), id);
        assert_eq!(s.selected(), None);
        assert!(!only(&s).flags().contains(AnnotationFlags::SELECTED));
    }

    #[test]
    fn scene_point_found_on_frame_diagonal() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Rectangle));
        down(&mut s, 10.0, 10.0, 0);
        up(&mut s, 30.0, 30.0, 10);
        let id = only(&s).id();

        let (w, h) = (40, 40);
        let mut data = vec![0xFF_u8; w * h * 4];
        data[(20 * w + 20) * 4] = 0;
        let buffer = IdBuffer::new(w, h, &data).expect("large enough");
        assert_eq!(
            s.scene_point_at(id, &buffer),
            Some(ScenePoint {
                x: 20.0,
                y: 20.0,
                z: 0.0
            })
        );

        let empty = vec![0xFF_u8; w * h * 4];
        let buffer = IdBuffer::new(w, h, &empty).expect("large enough");
        assert_eq!(s.scene_point_at(id, &buffer), None);
    }

    #[test]
    fn cloud_outline_follows_its_frame() {
        let mut s = session();
        s.set_tool(Some(AnnotationKind::Cloud));
        down(&mut s, 10.0, 10.0, 0);
        up(&mut s, 60.0, 50.0, 10);
        let id = only(&s).id();
        let bounds = s.outline(id).expect("cloud outline").bounding_box();
        assert!((bounds.center() - Point::new(35.0, 30.0)).hypot() < 0.5);
        assert!(bounds.width() >= 49.0);
    }

    #[test]
    fn frame_kinds_have_no_outline() {
        let mut s = session();
        let id = with_rectangle(&mut s);
        assert!(s.outline(id).is_none());
    }
}
