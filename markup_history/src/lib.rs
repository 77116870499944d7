// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup History: the live annotation store and its undo/redo log.
//!
//! Every edit to an [`AnnotationStore`] goes through a [`Command`]: create, delete, or a
//! [`Change`] to one property. [`ActionLog::execute`] applies the command and records it.
//!
//! - Consecutive changes to the same property of the same annotation merge into one step,
//!   and a merged step that ends where it started disappears.
//! - Groups bracket a gesture so it undoes as one step; cancelling a group rolls it back.
//! - Point-list edits never merge and never count as "no change".
//!
//! ```rust
//! use kurbo::Point;
//! use markup_history::{ActionLog, AnnotationStore, Change, Command};
//! use markup_model::{Annotation, AnnotationKind};
//!
//! let mut store = AnnotationStore::new();
//! let mut log = ActionLog::new();
//! let id = store.allocate_id();
//! log.execute(&mut store, Command::create(Annotation::new(id, AnnotationKind::Rectangle)));
//! log.execute(&mut store, Command::set(id, Change::Position(Point::new(4.0, 0.0))));
//! log.execute(&mut store, Command::set(id, Change::Position(Point::new(8.0, 0.0))));
//! assert_eq!(log.undo_len(), 2);
//!
//! log.undo(&mut store);
//! assert_eq!(store.get(id).unwrap().position(), Point::ZERO);
//! log.undo(&mut store);
//! assert!(store.is_empty());
//! ```
//!
//! Whole documents load and save through [`load_document`] and [`save_document`].

mod command;
mod document;
mod log;
mod store;

pub use command::{Action, Change, Command, CommandFlags, CreateAction, DeleteAction, SetAction};
pub use document::{
    DocumentError, LoadReport, SkipReason, SkippedRecord, load_document, load_records,
    save_document,
};
pub use log::{ActionLog, HistoryChange};
pub use store::AnnotationStore;
