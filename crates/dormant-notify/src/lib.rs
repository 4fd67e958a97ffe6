//! # Dormant report delivery
//!
//! [`ReportSink`](dormant_core::ReportSink) implementations for lifecycle
//! pass results:
//!
//! - [`FileSink`] writes an HTML report and/or the raw JSON result
//! - [`EmailNotifier`] sends a multipart text/HTML email over SMTP
//!
//! Both render through a shared [`ReportRenderer`].

pub mod config;
pub mod email;
pub mod error;
pub mod file;
pub mod render;

pub use config::NotificationConfig;
pub use email::EmailNotifier;
pub use error::{NotificationError, NotificationResult};
pub use file::FileSink;
pub use render::{subject, ReportRenderer, ReportView};
