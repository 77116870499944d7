// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive an edit session end to end: create, edit text, drag, undo, recover a scene point,
//! and save.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p markup_demos --example annotate_session`

use kurbo::{Affine, Point};
use markup_history::HistoryChange;
use markup_hit::IdBuffer;
use markup_model::{AffineViewport, AnnotationId, AnnotationKind};
use markup_session::{
    EditSession, PointerEvent, SessionConfig, SessionState, TextAccepted, TextInput,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A text editor that only reports what it would show.
#[derive(Debug, Default)]
struct LoggingTextInput {
    open: bool,
}

impl TextInput for LoggingTextInput {
    fn open(&mut self, id: AnnotationId, quad: [Point; 4], text: Option<&str>) {
        info!(%id, top_left = ?quad[0], text, "text editor opened");
        self.open = true;
    }

    fn close(&mut self) {
        info!("text editor closed");
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

fn click(session: &mut EditSession, at: (f64, f64), t: u64) {
    session.pointer_down(PointerEvent::mouse(at, t));
    session.pointer_up(PointerEvent::mouse(at, t + 8));
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = r#"{ "snap_radius_px": 12, "history_limit": 50 }"#;
    let config = SessionConfig::from_json_str(config).unwrap_or_default();
    let viewport = AffineViewport::new(Affine::scale(2.0), 800.0, 600.0);
    let mut session = EditSession::new(viewport, config)
        .with_text_input(Box::new(LoggingTextInput::default()));
    session.history_mut().on_change(|change| {
        if !matches!(change, HistoryChange::Executed { .. }) {
            info!(?change, "history changed");
        }
    });

    // A cloud dragged out on screen; annotation space is half the screen scale.
    session.set_tool(Some(AnnotationKind::Cloud));
    session.pointer_down(PointerEvent::mouse((100.0, 100.0), 0));
    for step in 1..=10_u32 {
        let d = f64::from(step) * 20.0;
        let at = (100.0 + d, 100.0 + d / 2.0);
        session.pointer_move(PointerEvent::mouse(at, u64::from(step) * 16));
    }
    session.pointer_up(PointerEvent::mouse((300.0, 200.0), 200));
    let cloud = session.selected();
    info!(?cloud, undo_steps = session.history().undo_len(), "cloud created");
    if let Some(outline) = cloud.and_then(|id| session.outline(id)) {
        info!(elements = outline.elements().len(), "cloud outline built");
    }

    // A closed polyline, one click per vertex, closed by clicking near the start.
    session.set_tool(Some(AnnotationKind::Polyline));
    click(&mut session, (400.0, 100.0), 1_000);
    click(&mut session, (500.0, 100.0), 2_000);
    click(&mut session, (500.0, 200.0), 3_000);
    click(&mut session, (403.0, 104.0), 4_000);
    info!(state = ?session.state(), "polyline closed");

    // A text label.
    session.set_tool(Some(AnnotationKind::Text));
    click(&mut session, (100.0, 400.0), 5_000);
    if matches!(session.state(), SessionState::EditingText { .. }) {
        session.accept_text(TextAccepted::text("Check this joint"));
    }

    // Drag the label to the right, then take it back.
    session.pointer_down(PointerEvent::mouse((120.0, 410.0), 6_000));
    session.pointer_move(PointerEvent::mouse((220.0, 410.0), 6_016));
    session.pointer_up(PointerEvent::mouse((220.0, 410.0), 6_032));
    session.undo();
    info!(
        undo = session.history().undo_len(),
        redo = session.history().redo_len(),
        "moved and undone"
    );

    // Recover a scene point from a rendered id-buffer that covers the cloud's center.
    let (w, h) = (800, 600);
    let mut pixels = vec![0xFF_u8; w * h * 4];
    for y in 140..160 {
        for x in 190..210 {
            pixels[(y * w + x) * 4] = 0;
        }
    }
    if let (Some(id), Some(buffer)) = (cloud, IdBuffer::new(w, h, &pixels)) {
        info!(point = ?session.scene_point_at(id, &buffer), "scene point under cloud");
    }

    match session.save() {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!(%err, "could not save"),
    }
}
