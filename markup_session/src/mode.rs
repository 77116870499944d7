// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind edit modes.
//!
//! An [`EditMode`] turns the pointer events of one creation gesture into commands. The
//! session owns the surrounding action group and the state machine; a mode only decides what
//! each event means for its kind and when the gesture is done.
//!
//! | Family       | Kinds                               | Gesture                              |
//! |--------------|-------------------------------------|--------------------------------------|
//! | `Drag`       | circle, cloud, rectangle, callout   | press, drag out a frame, release     |
//! | `Segment`    | arrow, dimension                    | press at the tail, release at head   |
//! | `Stroke`     | freehand, highlight                 | press, draw, release                 |
//! | `MultiClick` | polyline, polycloud                 | one click per vertex                 |
//! | `Text`       | text, stamp                         | click to place, then type            |

use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use markup_history::{ActionLog, AnnotationStore, Change, Command};
use markup_model::{
    Annotation, AnnotationId, AnnotationKind, CoordinateTransform, EditFamily, Frame, MIN_EXTENT,
    PointFrame, Segment, strategy_for,
};
use markup_path::{StrokeSmoother, simplify, view_tolerance};
use tracing::trace;

use crate::SessionConfig;

/// What the session should do after a mode handled an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeOutcome {
    /// Keep the gesture going.
    Continue,
    /// The annotation is complete; close the action group.
    Finish,
    /// The gesture failed; roll back the action group.
    Cancel,
    /// Geometry is complete; open the text editor before closing the group.
    EditText,
}

/// Everything a mode may touch while handling an event.
pub struct EditContext<'a> {
    /// Live annotations.
    pub store: &'a mut AnnotationStore,
    /// Undo log; the session has already opened the gesture's group.
    pub log: &'a mut ActionLog,
    /// Screen ↔ annotation conversions.
    pub transform: &'a dyn CoordinateTransform,
    /// Session tunables.
    pub config: &'a SessionConfig,
}

impl fmt::Debug for EditContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditContext")
            .field("annotations", &self.store.len())
            .field("undo_len", &self.log.undo_len())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl EditContext<'_> {
    /// Screen point to annotation space.
    pub fn to_annotation(&self, screen: Point) -> Point {
        self.transform.screen_to_annotation(screen)
    }

    /// Annotation point to screen space.
    pub fn to_screen(&self, p: Point) -> Point {
        self.transform.annotation_to_screen(p)
    }

    /// Apply and record `command`.
    pub fn execute(&mut self, command: Command) {
        self.log.execute(self.store, command);
    }

    /// Allocate an id, build an annotation of `kind`, and create it.
    fn create(
        &mut self,
        kind: AnnotationKind,
        build: impl FnOnce(&mut Annotation),
    ) -> AnnotationId {
        let id = self.store.allocate_id();
        let mut annotation = Annotation::new(id, kind);
        build(&mut annotation);
        self.execute(Command::create(annotation).selecting());
        id
    }
}

/// One creation or edit gesture in progress.
#[derive(Clone, Debug)]
pub struct Gesture {
    id: AnnotationId,
    kind: AnnotationKind,
    created: bool,
    start_screen: Point,
    start: Point,
    last_screen: Point,
    points: Vec<Point>,
    smoother: Option<StrokeSmoother>,
}

impl Gesture {
    fn new(id: AnnotationId, kind: AnnotationKind, screen: Point, start: Point) -> Self {
        Self {
            id,
            kind,
            created: true,
            start_screen: screen,
            start,
            last_screen: screen,
            points: Vec::new(),
            smoother: None,
        }
    }

    /// Edit an existing annotation rather than create one.
    pub(crate) fn existing(annotation: &Annotation, screen: Point) -> Self {
        Self {
            created: false,
            ..Self::new(annotation.id(), annotation.kind(), screen, annotation.position())
        }
    }

    /// The annotation being created or edited.
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Its kind.
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Whether the gesture created the annotation, as opposed to re-editing one.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Buffered points in annotation space.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn screen_extent(&self) -> Vec2 {
        let d = self.last_screen - self.start_screen;
        Vec2::new(d.x.abs(), d.y.abs())
    }
}

/// How one edit family turns pointer events into commands.
///
/// Positions handed to a mode are in screen space.
pub trait EditMode: fmt::Debug {
    /// The family this mode drives.
    fn family(&self) -> EditFamily;

    /// Create an annotation of `kind` under the pointer and start tracking the gesture.
    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture;

    /// What the press that began the gesture means on its own.
    fn press_outcome(&self) -> ModeOutcome {
        ModeOutcome::Continue
    }

    /// A further press while the gesture is in progress.
    fn pointer_down(
        &self,
        _gesture: &mut Gesture,
        _cx: &mut EditContext<'_>,
        _at: Point,
    ) -> ModeOutcome {
        ModeOutcome::Continue
    }

    /// Pointer travel.
    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome;

    /// Release.
    fn pointer_up(&self, gesture: &mut Gesture, cx: &mut EditContext<'_>, at: Point) -> ModeOutcome;

    /// A double-click while the gesture is in progress.
    fn double_click(
        &self,
        _gesture: &mut Gesture,
        _cx: &mut EditContext<'_>,
        _at: Point,
    ) -> ModeOutcome {
        ModeOutcome::Continue
    }

    /// Remove the most recent vertex.
    fn delete_last_vertex(&self, _gesture: &mut Gesture, _cx: &mut EditContext<'_>) -> ModeOutcome {
        ModeOutcome::Continue
    }

    /// Whether the gesture so far describes an annotation worth keeping.
    fn is_valid(&self, gesture: &Gesture, cx: &EditContext<'_>) -> bool;
}

/// Circle, cloud, rectangle, and callout: drag out a frame corner to corner.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragMode;

impl EditMode for DragMode {
    fn family(&self) -> EditFamily {
        EditFamily::Drag
    }

    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture {
        let start = cx.to_annotation(at);
        let id = cx.create(kind, |a| a.set_size(start, MIN_EXTENT, MIN_EXTENT));
        Gesture::new(id, kind, at, start)
    }

    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        let frame = Frame::from_corners(gesture.start, cx.to_annotation(at));
        cx.execute(Command::set(gesture.id, Change::Frame(frame)));
        ModeOutcome::Continue
    }

    fn pointer_up(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        self.pointer_move(gesture, cx, at);
        if self.is_valid(gesture, cx) {
            ModeOutcome::Finish
        } else {
            ModeOutcome::Cancel
        }
    }

    fn is_valid(&self, gesture: &Gesture, cx: &EditContext<'_>) -> bool {
        let extent = gesture.screen_extent();
        extent.x >= cx.config.min_size_px && extent.y >= cx.config.min_size_px
    }
}

/// Arrow and dimension: press at the tail, release at the head.
///
/// A dimension continues into the text editor for its label.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentMode;

impl EditMode for SegmentMode {
    fn family(&self) -> EditFamily {
        EditFamily::Segment
    }

    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture {
        let start = cx.to_annotation(at);
        let id = cx.create(kind, |a| a.set_segment(Segment::new(start, start)));
        Gesture::new(id, kind, at, start)
    }

    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        let segment = Segment::new(gesture.start, cx.to_annotation(at));
        cx.execute(Command::set(gesture.id, Change::Segment(segment)));
        ModeOutcome::Continue
    }

    fn pointer_up(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        self.pointer_move(gesture, cx, at);
        if !self.is_valid(gesture, cx) {
            ModeOutcome::Cancel
        } else if gesture.kind.uses_text_editing() {
            ModeOutcome::EditText
        } else {
            ModeOutcome::Finish
        }
    }

    fn is_valid(&self, gesture: &Gesture, cx: &EditContext<'_>) -> bool {
        gesture.start_screen.distance(gesture.last_screen) >= cx.config.min_size_px
    }
}

/// Freehand and highlight: capture a smoothed stroke, simplify it on release.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrokeMode;

impl EditMode for StrokeMode {
    fn family(&self) -> EditFamily {
        EditFamily::Stroke
    }

    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture {
        let start = cx.to_annotation(at);
        let id = cx.create(kind, |a| a.begin_capture(start));
        let mut smoother = StrokeSmoother::new(cx.config.smoothing_window);
        smoother.push(start);
        Gesture {
            points: vec![start],
            smoother: Some(smoother),
            ..Gesture::new(id, kind, at, start)
        }
    }

    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        let p = cx.to_annotation(at);
        gesture.points.push(p);
        if let Some(smoother) = &mut gesture.smoother {
            smoother.push(p);
            // Live preview; the finished stroke is recorded on release.
            if let Some(annotation) = cx.store.get_mut(gesture.id) {
                annotation.set_captured_points(smoother.points());
            }
        }
        ModeOutcome::Continue
    }

    fn pointer_up(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        if gesture.last_screen != at {
            self.pointer_move(gesture, cx, at);
        }
        let smoothed = gesture
            .smoother
            .as_mut()
            .map(StrokeSmoother::finish)
            .unwrap_or_else(|| gesture.points.clone());
        let tolerance = view_tolerance(cx.config.simplify_tolerance, cx.transform.view_diagonal());
        let simplified = simplify(&smoothed, tolerance, cx.config.highest_quality_simplify);
        trace!(
            raw = gesture.points.len(),
            smoothed = smoothed.len(),
            simplified = simplified.len(),
            "stroke captured"
        );
        if simplified.len() < 2 || !self.is_valid(gesture, cx) {
            return ModeOutcome::Cancel;
        }
        let frame = PointFrame::from_absolute(&simplified);
        cx.execute(Command::set(gesture.id, Change::Points(frame)));
        ModeOutcome::Finish
    }

    fn is_valid(&self, gesture: &Gesture, _cx: &EditContext<'_>) -> bool {
        gesture.points.len() >= 2
    }
}

/// Polyline and polycloud: one press per vertex.
///
/// The last buffered point is a placeholder that follows the pointer. Pressing near the first
/// vertex closes the shape; a double-click ends it open.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiClickMode;

impl MultiClickMode {
    fn sync(gesture: &Gesture, cx: &mut EditContext<'_>) {
        let frame = PointFrame::from_absolute(&gesture.points);
        cx.execute(Command::set(gesture.id, Change::Points(frame)));
    }

    /// Vertices placed so far, not counting the placeholder.
    fn placed(gesture: &Gesture) -> usize {
        gesture.points.len().saturating_sub(1)
    }
}

impl EditMode for MultiClickMode {
    fn family(&self) -> EditFamily {
        EditFamily::MultiClick
    }

    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture {
        let start = cx.to_annotation(at);
        let points = vec![start, start];
        let frame = PointFrame::from_absolute(&points);
        let id = cx.create(kind, |a| a.set_point_frame(frame));
        Gesture {
            points,
            ..Gesture::new(id, kind, at, start)
        }
    }

    fn pointer_down(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        let snap = cx.config.snap_radius_px;
        let near_first = gesture
            .points
            .first()
            .is_some_and(|first| cx.to_screen(*first).distance(at) <= snap);
        if near_first && Self::placed(gesture) >= 3 {
            gesture.points.pop();
            Self::sync(gesture, cx);
            cx.execute(Command::set(gesture.id, Change::Closed(true)));
            return ModeOutcome::Finish;
        }
        let p = cx.to_annotation(at);
        if let Some(last) = gesture.points.last_mut() {
            *last = p;
        }
        gesture.points.push(p);
        Self::sync(gesture, cx);
        ModeOutcome::Continue
    }

    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        let p = cx.to_annotation(at);
        match gesture.points.last_mut() {
            Some(last) if *last != p => *last = p,
            _ => return ModeOutcome::Continue,
        }
        Self::sync(gesture, cx);
        ModeOutcome::Continue
    }

    fn pointer_up(
        &self,
        _gesture: &mut Gesture,
        _cx: &mut EditContext<'_>,
        _at: Point,
    ) -> ModeOutcome {
        ModeOutcome::Continue
    }

    fn double_click(
        &self,
        gesture: &mut Gesture,
        cx: &mut EditContext<'_>,
        _at: Point,
    ) -> ModeOutcome {
        gesture.points.pop();
        // Vertices stacked at the end of the line.
        let slop = cx.config.double_click_distance_px;
        while let &[.., a, b] = gesture.points.as_slice()
            && cx.to_screen(a).distance(cx.to_screen(b)) <= slop
        {
            gesture.points.pop();
        }
        if gesture.points.len() < 2 {
            return ModeOutcome::Cancel;
        }
        let frame = PointFrame::from_absolute(&gesture.points);
        cx.execute(Command::set(gesture.id, Change::Points(frame)));
        ModeOutcome::Finish
    }

    fn delete_last_vertex(&self, gesture: &mut Gesture, cx: &mut EditContext<'_>) -> ModeOutcome {
        gesture.points.pop();
        gesture.points.pop();
        let Some(last) = gesture.points.last().copied() else {
            return ModeOutcome::Cancel;
        };
        gesture.points.push(last);
        Self::sync(gesture, cx);
        ModeOutcome::Continue
    }

    fn is_valid(&self, gesture: &Gesture, _cx: &EditContext<'_>) -> bool {
        let placed = &gesture.points[..Self::placed(gesture)];
        placed.windows(2).any(|w| w[0] != w[1])
    }
}

/// Text and stamp: click to place a default-sized box, then type.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextMode;

impl EditMode for TextMode {
    fn family(&self) -> EditFamily {
        EditFamily::Text
    }

    fn begin(&self, cx: &mut EditContext<'_>, kind: AnnotationKind, at: Point) -> Gesture {
        let start = cx.to_annotation(at);
        let size = cx.config.text_size();
        // The click marks the top-left corner.
        let center = start + Vec2::new(size.width / 2.0, size.height / 2.0);
        let id = cx.create(kind, |a| a.set_size(center, size.width, size.height));
        Gesture::new(id, kind, at, start)
    }

    fn press_outcome(&self) -> ModeOutcome {
        ModeOutcome::EditText
    }

    fn pointer_move(
        &self,
        gesture: &mut Gesture,
        _cx: &mut EditContext<'_>,
        at: Point,
    ) -> ModeOutcome {
        gesture.last_screen = at;
        ModeOutcome::Continue
    }

    fn pointer_up(
        &self,
        _gesture: &mut Gesture,
        _cx: &mut EditContext<'_>,
        _at: Point,
    ) -> ModeOutcome {
        ModeOutcome::EditText
    }

    fn is_valid(&self, _gesture: &Gesture, _cx: &EditContext<'_>) -> bool {
        true
    }
}

/// Kind → edit mode registry.
///
/// [`with_defaults`](Self::with_defaults) mirrors the kind → strategy registry of the model:
/// every kind gets the mode of its strategy's edit family.
#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: HashMap<AnnotationKind, Box<dyn EditMode>>,
}

impl ModeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every kind mapped to its family's built-in mode.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in AnnotationKind::ALL {
            let mode: Box<dyn EditMode> = match strategy_for(kind).edit_family() {
                EditFamily::Drag => Box::new(DragMode),
                EditFamily::Segment => Box::new(SegmentMode),
                EditFamily::Stroke => Box::new(StrokeMode),
                EditFamily::MultiClick => Box::new(MultiClickMode),
                EditFamily::Text => Box::new(TextMode),
            };
            registry.register(kind, mode);
        }
        registry
    }

    /// Use `mode` for `kind`, returning the mode it replaces.
    pub fn register(
        &mut self,
        kind: AnnotationKind,
        mode: Box<dyn EditMode>,
    ) -> Option<Box<dyn EditMode>> {
        self.modes.insert(kind, mode)
    }

    /// The mode for `kind`.
    pub fn get(&self, kind: AnnotationKind) -> Option<&dyn EditMode> {
        self.modes.get(&kind).map(Box::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markup_model::AffineViewport;

    struct Fixture {
        store: AnnotationStore,
        log: ActionLog,
        transform: AffineViewport,
        config: SessionConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: AnnotationStore::new(),
                log: ActionLog::new(),
                transform: AffineViewport::identity(),
                config: SessionConfig::default(),
            }
        }

        fn cx(&mut self) -> EditContext<'_> {
            EditContext {
                store: &mut self.store,
                log: &mut self.log,
                transform: &self.transform,
                config: &self.config,
            }
        }
    }

    #[test]
    fn registry_covers_every_kind() {
        let registry = ModeRegistry::with_defaults();
        for kind in AnnotationKind::ALL {
            let mode = registry.get(kind).expect("registered");
            assert_eq!(mode.family(), kind.edit_family());
        }
    }

    #[test]
    fn drag_mode_sizes_frame_and_rejects_tiny_drags() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = DragMode;
        let mut gesture = mode.begin(&mut cx, AnnotationKind::Rectangle, Point::new(10.0, 10.0));
        mode.pointer_move(&mut gesture, &mut cx, Point::new(40.0, 30.0));
        assert_eq!(
            mode.pointer_up(&mut gesture, &mut cx, Point::new(50.0, 50.0)),
            ModeOutcome::Finish
        );
        let rect = fx.store.get(gesture.id()).expect("live");
        assert_eq!(rect.position(), Point::new(30.0, 30.0));
        assert_eq!(rect.size(), kurbo::Size::new(40.0, 40.0));

        let mut cx = fx.cx();
        let mut tiny = mode.begin(&mut cx, AnnotationKind::Circle, Point::new(10.0, 10.0));
        assert_eq!(
            mode.pointer_up(&mut tiny, &mut cx, Point::new(12.0, 40.0)),
            ModeOutcome::Cancel
        );
    }

    #[test]
    fn segment_mode_routes_dimension_to_text() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = SegmentMode;
        let mut arrow = mode.begin(&mut cx, AnnotationKind::Arrow, Point::ZERO);
        assert_eq!(
            mode.pointer_up(&mut arrow, &mut cx, Point::new(30.0, 40.0)),
            ModeOutcome::Finish
        );
        let mut dim = mode.begin(&mut cx, AnnotationKind::Dimension, Point::ZERO);
        assert_eq!(
            mode.pointer_up(&mut dim, &mut cx, Point::new(30.0, 40.0)),
            ModeOutcome::EditText
        );
        let len = fx.store.get(arrow.id()).map(|a| a.size().width);
        assert_eq!(len, Some(50.0));
    }

    #[test]
    fn multi_click_closes_near_first_vertex() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = MultiClickMode;
        let mut g = mode.begin(&mut cx, AnnotationKind::Polyline, Point::new(0.0, 0.0));
        mode.pointer_up(&mut g, &mut cx, Point::new(0.0, 0.0));
        mode.pointer_move(&mut g, &mut cx, Point::new(50.0, 0.0));
        assert_eq!(
            mode.pointer_down(&mut g, &mut cx, Point::new(50.0, 0.0)),
            ModeOutcome::Continue
        );
        mode.pointer_down(&mut g, &mut cx, Point::new(50.0, 50.0));
        assert_eq!(g.points().len(), 4);
        assert_eq!(
            mode.pointer_down(&mut g, &mut cx, Point::new(3.0, 4.0)),
            ModeOutcome::Finish
        );
        let poly = fx.store.get(g.id()).expect("live");
        assert!(poly.is_closed());
        assert_eq!(
            poly.absolute_points(),
            vec![
                Point::new(0.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(50.0, 50.0)
            ]
        );
    }

    #[test]
    fn multi_click_delete_and_double_click() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = MultiClickMode;
        let mut g = mode.begin(&mut cx, AnnotationKind::Polycloud, Point::new(0.0, 0.0));
        mode.pointer_down(&mut g, &mut cx, Point::new(40.0, 0.0));
        mode.pointer_down(&mut g, &mut cx, Point::new(40.0, 40.0));
        assert_eq!(
            g.points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(40.0, 0.0),
                Point::new(40.0, 40.0),
                Point::new(40.0, 40.0)
            ]
        );
        mode.delete_last_vertex(&mut g, &mut cx);
        assert_eq!(
            g.points(),
            &[Point::new(0.0, 0.0), Point::new(40.0, 0.0), Point::new(40.0, 0.0)]
        );
        // Double-click at (80, 0): the first click placed a vertex, the second ends the shape.
        mode.pointer_down(&mut g, &mut cx, Point::new(80.0, 0.0));
        assert_eq!(
            mode.double_click(&mut g, &mut cx, Point::new(80.0, 0.0)),
            ModeOutcome::Finish
        );
        let cloud = fx.store.get(g.id()).expect("live");
        assert!(!cloud.is_closed());
        assert_eq!(cloud.absolute_points().len(), 3);
    }

    #[test]
    fn stroke_mode_records_simplified_relative_points() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = StrokeMode;
        let mut g = mode.begin(&mut cx, AnnotationKind::Freehand, Point::new(0.0, 0.0));
        for i in 1..=20 {
            mode.pointer_move(&mut g, &mut cx, Point::new(f64::from(i) * 5.0, 0.0));
        }
        assert_eq!(
            mode.pointer_up(&mut g, &mut cx, Point::new(100.0, 0.0)),
            ModeOutcome::Finish
        );
        let stroke = fx.store.get(g.id()).expect("live");
        assert!(
            !stroke
                .flags()
                .contains(markup_model::AnnotationFlags::ABSOLUTE_POINTS)
        );
        // A straight stroke simplifies to its two ends.
        assert_eq!(stroke.points().len(), 2);
        assert!(stroke.size().width > 90.0);
    }

    #[test]
    fn text_mode_places_top_left_at_click() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mode = TextMode;
        let mut g = mode.begin(&mut cx, AnnotationKind::Text, Point::new(10.0, 20.0));
        assert_eq!(mode.press_outcome(), ModeOutcome::EditText);
        assert_eq!(
            mode.pointer_up(&mut g, &mut cx, Point::new(10.0, 20.0)),
            ModeOutcome::EditText
        );
        let text = fx.store.get(g.id()).expect("live");
        assert_eq!(text.position(), Point::new(90.0, 40.0));
    }
}
