//! Client for the FES Acatlán "escolares" group-saturation report.

pub mod cookies;
pub mod errors;
pub mod models;
pub mod session;

pub use errors::{NegotiationError, Stage};
pub use models::{ProgramRef, default_programs};
pub use session::{Endpoints, Report, ReportSource, SessionNegotiator, build_client};
