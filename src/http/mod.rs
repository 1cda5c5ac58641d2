//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (lifecycle, layer composition)
//!     → pipeline.rs (ordered pre-processing stages)
//!         request.rs  (request ID, per-request context)
//!         assets.rs   (static files, may answer directly)
//!         body.rs     (JSON body parsing and limits)
//!     → route handler, or responders.rs for unmatched requests
//!     → errors.rs (classify, report, render any failure)
//!     → Send to client
//! ```

pub mod assets;
pub mod body;
pub mod errors;
pub mod pipeline;
pub mod request;
pub mod responders;
pub mod server;
pub mod status;

pub use body::{JsonBody, ParsedBody};
pub use pipeline::{Flow, Pipeline, Stage};
pub use request::{Identity, RequestContext, RequestId, X_REQUEST_ID};
pub use server::{build_app, HttpServer};
