//! Session negotiation with the group-saturation report pages.
//!
//! The report is only served to a session that has first loaded the program
//! menu and then posted a program selection, in that order, with the cookies
//! and `Referer` a browser would send. Each program therefore costs three
//! requests and two mandatory pauses.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderValue, REFERER};
use reqwest::{RequestBuilder, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use crate::acatlan::cookies::SessionCookies;
use crate::acatlan::errors::{NegotiationError, Stage};
use crate::acatlan::models::ProgramRef;
use crate::pacing::{PauseReason, Pacer, Pacing};
use crate::utils::fmt_duration;

/// Fixed hidden fields the selection form always submits.
const CONTROL_FIELDS: [(&str, &str); 2] = [("control1", "UNO"), ("control2", "tres")];

/// Name of the program drop-down in the selection form.
const PROGRAM_FIELD: &str = "Carreras";

/// Any of these in the report body means the server produced schedule data.
/// The server answers 200 for "nothing to show" too, so this is the only signal.
const REPORT_MARKERS: [&str; 2] = ["GRUPO", "SEMESTRE"];

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The report body, containing schedule markup.
    Populated(String),
    /// The server answered but had no schedule data for the program.
    Empty,
}

impl Report {
    /// Classify a report body by sniffing for populated-report markers.
    pub fn from_body(body: String) -> Self {
        let has_table = body.to_ascii_lowercase().contains("<table");
        if has_table || REPORT_MARKERS.iter().any(|m| body.contains(m)) {
            Self::Populated(body)
        } else {
            Self::Empty
        }
    }
}

/// Something that can produce the report for a program.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(&self, program: &ProgramRef) -> Result<Report, NegotiationError>;
}

/// Absolute URLs of the three pages involved in one negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub menu: Url,
    pub selection: Url,
    pub report: Url,
}

impl Endpoints {
    pub fn new(
        base: &Url,
        menu_path: &str,
        selection_path: &str,
        report_path: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            menu: base.join(menu_path)?,
            selection: base.join(selection_path)?,
            report: base.join(report_path)?,
        })
    }
}

/// Build the HTTP client used for every negotiation.
///
/// No cookie store is enabled: [`SessionCookies`] carries the session explicitly.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("es-ES,es;q=0.9,en;q=0.8"),
    );

    reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

/// Client for the three-step report retrieval.
pub struct SessionNegotiator {
    http: reqwest::Client,
    endpoints: Endpoints,
    pacing: Pacing,
    pacer: Arc<dyn Pacer>,
}

impl SessionNegotiator {
    pub fn new(
        http: reqwest::Client,
        endpoints: Endpoints,
        pacing: Pacing,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            http,
            endpoints,
            pacing,
            pacer,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send one request with the session cookies attached, fail on a non-success
    /// status, and absorb whatever cookies the response sets.
    async fn exchange(
        &self,
        stage: Stage,
        request: RequestBuilder,
        cookies: &mut SessionCookies,
    ) -> Result<Response, NegotiationError> {
        let request = match cookies.header_value() {
            Some(value) => request.header(COOKIE, value),
            None => request,
        };

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|source| NegotiationError::Transport { stage, source })?;

        let status = response.status();
        debug!(
            stage = %stage,
            status = status.as_u16(),
            duration = fmt_duration(start.elapsed()),
            "exchange complete"
        );
        if !status.is_success() {
            return Err(NegotiationError::Status {
                stage,
                status: status.as_u16(),
            });
        }

        cookies.absorb(response.headers());
        Ok(response)
    }

    /// Run the full menu → selection → report sequence and return the report body.
    pub async fn negotiate(&self, program: &ProgramRef) -> Result<String, NegotiationError> {
        let mut cookies = SessionCookies::new();
        let selector = program.selector();

        self.exchange(
            Stage::Menu,
            self.http.get(self.endpoints.menu.clone()),
            &mut cookies,
        )
        .await?;
        debug!(cookies = cookies.len(), "session opened");

        self.pacer
            .pause(PauseReason::BeforeSelection, self.pacing.selection_delay)
            .await;

        let mut form: Vec<(&str, &str)> = vec![(PROGRAM_FIELD, selector.as_str())];
        form.extend(CONTROL_FIELDS);
        self.exchange(
            Stage::Selection,
            self.http
                .post(self.endpoints.selection.clone())
                .header(REFERER, self.endpoints.menu.as_str())
                .form(&form),
            &mut cookies,
        )
        .await?;

        self.pacer
            .pause(PauseReason::BeforeReport, self.pacing.report_delay)
            .await;

        let response = self
            .exchange(
                Stage::Report,
                self.http
                    .get(self.endpoints.report.clone())
                    .header(REFERER, self.endpoints.selection.as_str()),
                &mut cookies,
            )
            .await?;

        response
            .text()
            .await
            .map_err(|source| NegotiationError::Transport {
                stage: Stage::Report,
                source,
            })
    }
}

#[async_trait]
impl ReportSource for SessionNegotiator {
    async fn fetch_report(&self, program: &ProgramRef) -> Result<Report, NegotiationError> {
        info!(program = %program.code, name = %program.name, "negotiating report session");
        let body = self.negotiate(program).await?;
        debug!(program = %program.code, bytes = body.len(), "report received");
        Ok(Report::from_body(body))
    }
}
