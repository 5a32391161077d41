//! Core library for the task-ledger command line application.
//!
//! The library reconciles a task-definition workbook (one sheet per task
//! group) against a returned-tasks workbook and reports what is still
//! outstanding. IO adapters live under [`io`], the data model inside
//! [`model`], code discovery in [`extract`] and [`returned`], keyword
//! classification in [`classify`], aggregation in [`reconcile`], report
//! tables in [`report`], and the run orchestration under [`pipeline`].

pub mod classify;
pub mod error;
pub mod extract;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod returned;

pub use error::{Result, ToolError};
