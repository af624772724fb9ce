use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use crate::Config;
use crate::client::dto::{Course, CourseContentSave, ProgressUpdate, remote_percentage};
use crate::client::{ClientError, ClientResult, ContentSource, ProgressSync};
use crate::model::CourseContent;

/// HTTP client for the flat-file backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> ClientResult<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: Url::parse(&base)?,
            token,
        })
    }

    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let backend = config.backend();
        Self::new(
            backend.base_url(),
            backend.token().map(str::to_string),
            backend.timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.base.join(path)?;
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> ClientResult<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: resp.url().to_string(),
            });
        }
        Ok(resp)
    }

    async fn get_json(&self, path: &str) -> ClientResult<Value> {
        let resp = self.send(self.request(Method::GET, path)?).await?;
        Ok(resp.json::<Value>().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_course(&self, course_id: u64) -> ClientResult<Course> {
        let body = self.get_json(&format!("courses/{course_id}")).await?;
        Course::from_response(&body, course_id)
    }

    /// Remote aggregate percentage; `None` if the user has no progress record yet.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_progress(&self, course_id: u64) -> ClientResult<Option<u8>> {
        match self.get_json(&format!("progress/{course_id}")).await {
            Ok(body) => Ok(remote_percentage(&body)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn post_progress(&self, update: &ProgressUpdate) -> ClientResult<()> {
        let req = self.request(Method::POST, "progress")?.json(update);
        self.send(req).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn save_course_content(
        &self,
        course_id: u64,
        content: &CourseContent,
    ) -> ClientResult<()> {
        let body = CourseContentSave::new(content)?;
        let req = self
            .request(Method::PUT, &format!("courses/{course_id}"))?
            .json(&body);
        self.send(req).await?;
        tracing::info!("saved content of course {course_id}");
        Ok(())
    }
}

#[async_trait]
impl ContentSource for BackendClient {
    async fn get_course(&self, course_id: u64) -> ClientResult<Course> {
        self.fetch_course(course_id).await
    }

    async fn get_progress(&self, course_id: u64) -> ClientResult<Option<u8>> {
        self.fetch_progress(course_id).await
    }
}

#[async_trait]
impl ProgressSync for BackendClient {
    async fn update_progress(&self, update: &ProgressUpdate) -> ClientResult<()> {
        self.post_progress(update).await
    }
}
