use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

mod model;

pub use model::{Direction, Id, LESSON_SEPARATOR, Lesson, Material, Subject};
use model::LessonDetail;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
pub const DEFAULT_API_ROOT: &str = "https://study-api.onlineschool-1.ru";
pub const DEFAULT_SITE_ROOT: &str = "https://onlineschool-1.ru";

#[derive(Debug, Error)]
pub enum SchoolError {
    #[error("Login failed with status {0}")]
    LoginFailed(StatusCode),
    #[error("Unauthorized: {0}")]
    Unauthorized(StatusCode),
    #[error("Request failed with status {0}")]
    RequestFailed(StatusCode),
    #[error("Not authenticated, no bearer token")]
    NotAuthenticated,
    #[error("Not found lesson {lesson} in {subject}")]
    LessonNotFound { lesson: Id, subject: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Roots of the platform's API host and of the student-facing site.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_root: String,
    pub site_root: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            site_root: DEFAULT_SITE_ROOT.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(api_root: impl Into<String>, site_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            site_root: site_root.into().trim_end_matches('/').to_string(),
        }
    }

    fn auth(&self) -> String {
        format!("{}/api/auth", self.api_root)
    }

    fn subjects(&self) -> String {
        format!("{}/api/v2/widget/list-programs-student/main", self.api_root)
    }

    fn lesson_detail(&self, id: &Id) -> String {
        format!("{}/api/widget/lesson-detail-student/{}", self.api_root, id)
    }

    pub fn subject_page(&self, id: &Id) -> String {
        format!("{}/study/my-programs/subject/{}", self.site_root, id)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Deserialize)]
struct SubjectsPage {
    results: Vec<Value>,
}

/// Session against the platform: one HTTP client with a browser user agent,
/// the account credentials and the current bearer token.
pub struct SchoolClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    login: String,
    password: String,
    token: Option<String>,
    dump_path: Option<PathBuf>,
}

impl SchoolClient {
    pub fn new(login: String, password: String, endpoints: Endpoints) -> Result<Self, SchoolError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .user_agent(USER_AGENT)
                .build()?,
            endpoints,
            login,
            password,
            token: None,
            dump_path: None,
        })
    }

    /// Writes every raw lesson-detail response to `path`, overwriting it.
    pub fn with_dump(mut self, path: Option<PathBuf>) -> Self {
        self.dump_path = path;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchanges login and password for a bearer token and keeps it for all
    /// later calls. Any non-2xx answer is a login failure.
    pub async fn authenticate(&mut self) -> Result<(), SchoolError> {
        let response = self
            .client
            .post(self.endpoints.auth())
            .json(&LoginRequest {
                login: &self.login,
                password: &self.password,
            })
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "auth response");
        if !status.is_success() {
            return Err(SchoolError::LoginFailed(status));
        }

        let body = response.bytes().await?;
        let LoginResponse { access_token } = serde_json::from_slice(&body)?;
        self.token = Some(access_token);
        info!("received bearer token");
        Ok(())
    }

    async fn get_authorized(&self, url: &str) -> Result<Value, SchoolError> {
        let token = self.token.as_deref().ok_or(SchoolError::NotAuthenticated)?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        debug!(%url, %status, "GET");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SchoolError::Unauthorized(status)),
            s if !s.is_success() => Err(SchoolError::RequestFailed(s)),
            _ => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
        }
    }

    /// Raw subject records from `response.results` of the subjects list.
    pub async fn fetch_subjects(&self) -> Result<Vec<Value>, SchoolError> {
        let raw = self.get_authorized(&self.endpoints.subjects()).await?;
        let page: Envelope<SubjectsPage> = serde_json::from_value(raw)?;
        info!(count = page.response.results.len(), "fetched subject list");
        Ok(page.response.results)
    }

    pub(crate) async fn fetch_lesson(&self, id: &Id) -> Result<LessonDetail, SchoolError> {
        let raw = self.get_authorized(&self.endpoints.lesson_detail(id)).await?;
        if let Some(path) = &self.dump_path {
            std::fs::write(path, serde_json::to_string_pretty(&raw)?)?;
            debug!(path = %path.display(), "dumped lesson detail");
        }
        let detail: Envelope<LessonDetail> = serde_json::from_value(raw)?;
        Ok(detail.response)
    }

    /// Subject catalog: a fresh list call when `reload` is set, otherwise the
    /// cache file. A missing cache falls back to the network. The session must
    /// already be authenticated for the network path.
    pub async fn load_catalog(
        &self,
        reload: bool,
        cache: &Path,
        save: bool,
    ) -> Result<Vec<Value>, SchoolError> {
        if !reload {
            if let Some(records) = read_cache(cache)? {
                info!(path = %cache.display(), count = records.len(), "subject list read from cache");
                return Ok(records);
            }
            println!("[!] No cached subjects at \"{}\", loading them again", cache.display());
        }

        println!("[+] Loading subjects...");
        let records = self.fetch_subjects().await?;
        println!("[+] Parsed response");
        if save {
            write_cache(cache, &records)?;
            println!("[+] Saved {} results", records.len());
        }
        Ok(records)
    }

    pub fn subjects(&self, records: &[Value]) -> Result<Vec<Subject>, SchoolError> {
        records
            .iter()
            .map(|record| Subject::from_record(record, &self.endpoints))
            .collect()
    }
}

pub fn read_cache(path: &Path) -> Result<Option<Vec<Value>>, SchoolError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Stores the records verbatim, pretty-printed, non-ASCII kept as is.
pub fn write_cache(path: &Path, records: &[Value]) -> Result<(), SchoolError> {
    std::fs::write(path, serde_json::to_string_pretty(records)?)?;
    debug!(path = %path.display(), "subject list cached");
    Ok(())
}
