use serde::{Deserialize, Serialize};
use std::fmt;

/// A degree program offered by the source system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRef {
    /// Program code, e.g. `"20321"`.
    pub code: String,
    /// Display name, e.g. `"Actuaría"`.
    #[serde(alias = "display_name")]
    pub name: String,
    /// Value posted by the program drop-down (`"20321,Actuaría"`).
    /// Defaults to `"{code},{name}"` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl ProgramRef {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// The form value identifying this program in the selection POST.
    pub fn selector(&self) -> String {
        self.selector
            .clone()
            .unwrap_or_else(|| format!("{},{}", self.code, self.name))
    }
}

impl fmt::Display for ProgramRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Programs listed in the source system's drop-down, in menu order.
///
/// (code, option value, display name)
const DEFAULT_PROGRAMS: &[(&str, &str, &str)] = &[
    ("20321", "20321,Actuaría", "Actuaría"),
    ("20121", "20121,Arquitectura", "Arquitectura"),
    ("20422", "20422,Ciencias Políticas y Admon. Pública", "Ciencias Políticas"),
    ("20425", "20425,Comunicación", "Comunicación"),
    ("20721", "20721,Derecho", "Derecho"),
    ("20226", "20226,Diseño Gráfico", "Diseño Gráfico"),
    ("20821", "20821,Economía", "Economía"),
    ("24121", "24121,Enseñanza de Inglés", "Enseñanza de Inglés"),
    ("21011", "21011,Filosofía", "Filosofía"),
    ("21021", "21021,Historia", "Historia"),
    ("21121", "21121,Ingeniería Civil", "Ingeniería Civil"),
    ("21013", "21013,Lengua y Literatura Hispánicas", "Lengua y Literatura"),
    ("24022", "24022,Matemáticas. Apl. y Comp.", "Matemáticas Aplicadas"),
    ("21025", "21025,Pedagogía", "Pedagogía"),
    ("20424", "20424,Periodismo y Comunicación Colectiva", "Periodismo"),
    ("20421", "20421,Relaciones Internacionales", "Relaciones Internacionales"),
    ("20423", "20423,Sociología", "Sociología"),
];

/// The full program catalog used when configuration doesn't provide one.
pub fn default_programs() -> Vec<ProgramRef> {
    DEFAULT_PROGRAMS
        .iter()
        .map(|&(code, selector, name)| ProgramRef::new(code, name).with_selector(selector))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_defaults_to_code_and_name() {
        let program = ProgramRef::new("20321", "Actuaría");
        assert_eq!(program.selector(), "20321,Actuaría");
    }

    #[test]
    fn test_explicit_selector_wins() {
        let program = ProgramRef::new("20422", "Ciencias Políticas")
            .with_selector("20422,Ciencias Políticas y Admon. Pública");
        assert_eq!(program.selector(), "20422,Ciencias Políticas y Admon. Pública");
    }

    #[test]
    fn test_default_programs_have_unique_codes() {
        let programs = default_programs();
        let mut codes: Vec<&str> = programs.iter().map(|p| p.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), programs.len());
        assert!(programs.iter().all(|p| p.selector().starts_with(&p.code)));
    }
}
