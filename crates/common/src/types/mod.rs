use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Outcome of a form submission, carried to the next page as a query flag
/// (`?success=...` or `?error=...`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub fn key(&self) -> &'static str {
        match self {
            Flash::Success(_) => "success",
            Flash::Error(_) => "error",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Flash::Success(v) | Flash::Error(v) => v,
        }
    }

    /// Append the flag to `path`, keeping an existing query string intact.
    pub fn redirect_target(&self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{path}{sep}{}={}", self.key(), self.value())
    }
}
