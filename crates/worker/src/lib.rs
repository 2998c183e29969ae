//! Background import worker for intake
//!
//! Callers hand an [`ImportSource`](intake_sheet::ImportSource) to an
//! [`ImportWorker`] and get back exactly one [`ImportReply`]: either the
//! per-sheet rows or a single error message. Parsing runs on tokio's blocking
//! pool, away from whatever async context submitted the request.
//!
//! ```no_run
//! use intake_sheet::{ExtractOptions, ImportSource};
//! use intake_worker::{ImportWorker, WorkerConfig};
//!
//! # async fn run() -> Result<(), intake_worker::WorkerError> {
//! let worker = ImportWorker::spawn(&WorkerConfig::default(), ExtractOptions::default());
//! let reply = worker.submit(ImportSource::path("clients.xlsx")).await?;
//! println!("{}", serde_json::to_string(&reply.response).unwrap());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod message;
mod worker;

pub use config::{ExtractConfig, IntakeConfig, ServerConfig, WorkerConfig, ADDR_ENV};
pub use error::{ConfigError, Result, WorkerError};
pub use message::{ImportReply, ImportRequest, ImportResponse, RequestId};
pub use worker::ImportWorker;
