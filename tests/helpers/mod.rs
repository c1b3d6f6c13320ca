#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::header::{COOKIE, REFERER, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use horarios::acatlan::{Endpoints, SessionNegotiator, build_client};
use horarios::pacing::{PauseReason, Pacer, Pacing};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const MENU_PATH: &str = "MenuGrupoSIsaturacionORDInarioAlumno.ASP";
pub const SELECTION_PATH: &str = "MenuGrupoSIsaturacionORDInarioAlumno1.asp";
pub const REPORT_PATH: &str = "ProcesoGRUpoSISaturacionORDINArioAlumno.asp";

/// Cookie the fake menu page hands out.
pub const MENU_COOKIE: &str = "ASPSESSIONIDQQ=menu-session";

const EMPTY_REPORT: &str = "<html><body><p>No existen grupos registrados</p></body></html>";

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub cookie: Option<String>,
    pub referer: Option<String>,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FakeState {
    requests: Vec<RecordedRequest>,
    reports: HashMap<String, String>,
    report_failures: HashMap<String, u16>,
    path_failures: HashMap<String, u16>,
    selection_session: Option<String>,
}

/// In-process stand-in for the group-saturation pages.
///
/// The selection page remembers the chosen program in a cookie, and the report
/// page serves whatever body was registered for that program.
#[derive(Clone)]
pub struct FakeAcatlan {
    base: Url,
    state: Arc<Mutex<FakeState>>,
}

impl FakeAcatlan {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: Url::parse(&format!("http://{addr}/HISTORIA/")).unwrap(),
            state,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.base, MENU_PATH, SELECTION_PATH, REPORT_PATH).unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        self.base.join(path).unwrap().to_string()
    }

    /// Serve `html` as the report for program `code`.
    pub fn set_report(&self, code: &str, html: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .reports
            .insert(code.to_owned(), html.into());
    }

    /// Answer the report page for program `code` with `status`.
    pub fn fail_report(&self, code: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .report_failures
            .insert(code.to_owned(), status);
    }

    /// Answer every request for `path` with `status`.
    pub fn fail_path(&self, path: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .path_failures
            .insert(format!("/HISTORIA/{path}"), status);
    }

    /// Make the selection page issue the session cookie again with `value`.
    pub fn reissue_session_on_selection(&self, value: &str) {
        self.state.lock().unwrap().selection_session = Some(value.to_owned());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn selected_program(cookie: Option<&str>) -> Option<String> {
    cookie?
        .split("; ")
        .find_map(|pair| pair.strip_prefix("CARRERA="))
        .map(str::to_owned)
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let recorded = RecordedRequest {
        method,
        path: uri.path().to_owned(),
        cookie: header(COOKIE),
        referer: header(REFERER),
        form: url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect(),
    };

    let mut state = state.lock().unwrap();
    state.requests.push(recorded.clone());

    if let Some(&status) = state.path_failures.get(&recorded.path) {
        return StatusCode::from_u16(status).unwrap().into_response();
    }

    let page = recorded.path.trim_start_matches("/HISTORIA/");
    if page == MENU_PATH {
        (
            [(SET_COOKIE, format!("{MENU_COOKIE}; path=/"))],
            "<html><select name=\"Carreras\"></select></html>",
        )
            .into_response()
    } else if page == SELECTION_PATH {
        let code = recorded
            .form_value("Carreras")
            .and_then(|v| v.split(',').next())
            .unwrap_or_default()
            .to_owned();
        let mut cookies = HeaderMap::new();
        cookies.append(
            SET_COOKIE,
            HeaderValue::from_str(&format!("CARRERA={code}; path=/")).unwrap(),
        );
        if let Some(session) = &state.selection_session {
            let name = MENU_COOKIE.split('=').next().unwrap_or_default();
            cookies.append(
                SET_COOKIE,
                HeaderValue::from_str(&format!("{name}={session}; path=/")).unwrap(),
            );
        }
        (cookies, "<html>ok</html>").into_response()
    } else if page == REPORT_PATH {
        let Some(code) = selected_program(recorded.cookie.as_deref()) else {
            return EMPTY_REPORT.into_response();
        };
        if let Some(&status) = state.report_failures.get(&code) {
            return StatusCode::from_u16(status).unwrap().into_response();
        }
        state
            .reports
            .get(&code)
            .cloned()
            .unwrap_or_else(|| EMPTY_REPORT.to_owned())
            .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Records every pause without sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(PauseReason, Duration)>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<(PauseReason, Duration)> {
        self.pauses.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<PauseReason> {
        self.pauses().into_iter().map(|(reason, _)| reason).collect()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, reason: PauseReason, duration: Duration) {
        self.pauses.lock().unwrap().push((reason, duration));
    }
}

pub fn negotiator(server: &FakeAcatlan, pacer: Arc<RecordingPacer>) -> SessionNegotiator {
    let http = build_client("horarios-test", Duration::from_secs(5)).unwrap();
    SessionNegotiator::new(http, server.endpoints(), Pacing::default(), pacer)
}

/// A group header followed by its course rows.
pub struct GroupRows<'a> {
    pub semester: u32,
    pub group: &'a str,
    /// `(code, name, schedule, instructor, room)`
    pub courses: Vec<(&'a str, &'a str, &'a str, &'a str, &'a str)>,
}

/// Render a report page shaped like the real one.
pub fn report_html(groups: &[GroupRows<'_>]) -> String {
    let mut rows = String::new();
    for (i, group) in groups.iter().enumerate() {
        rows.push_str(&format!(
            "<tr><th colspan=\"6\">{} SEMESTRE:{} GRUPO:{}</th></tr>\n",
            i + 1,
            group.semester,
            group.group
        ));
        rows.push_str("<tr><td>CLAVE</td><td>ASIGNATURA</td><td>HORARIO</td><td>PROFESOR</td><td>SALÓN</td></tr>\n");
        for (code, name, schedule, instructor, room) in &group.courses {
            rows.push_str(&format!(
                "<tr><td class=\"despliegues\">{code}</td><td>{name}</td><td>{schedule}</td><td>{instructor}</td><td>{room}</td></tr>\n"
            ));
        }
    }
    format!(
        "<html><body><table id=\"despimp\">\n{rows}</table></body></html>"
    )
}
