//! Async client for an Open Collaboration Services endpoint.

use reqwest::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder};

/// Response format requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

/// Raw server reply. OCS reports most failures inside the body with HTTP
/// 200, so callers inspect `body` rather than `status`.
#[derive(Debug, Clone)]
pub struct OcsReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub www_authenticate: Option<String>,
    pub body: String,
}

impl OcsReply {
    /// Parse a JSON body.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

pub struct OcsClient {
    client: Client,
    /// Endpoint root, e.g. `http://host/ocs/v1.php`.
    base_url: String,
    credentials: Option<(String, String)>,
}

impl OcsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    /// Send Basic credentials with every request.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub async fn config(&self, format: Format) -> Result<OcsReply, reqwest::Error> {
        self.get(&format!("/config.{}", format.as_str()), &[]).await
    }

    pub async fn person_check(
        &self,
        format: Format,
        login: &str,
        password: &str,
    ) -> Result<OcsReply, reqwest::Error> {
        self.post(
            &format!("/person/check.{}", format.as_str()),
            &[("login", login), ("password", password)],
        )
        .await
    }

    pub async fn activity(
        &self,
        format: Format,
        page: u32,
        page_size: u32,
    ) -> Result<OcsReply, reqwest::Error> {
        let (page, page_size) = (page.to_string(), page_size.to_string());
        self.get(
            &format!("/activity.{}", format.as_str()),
            &[("page", page.as_str()), ("pagesize", page_size.as_str())],
        )
        .await
    }

    pub async fn post_activity(
        &self,
        format: Format,
        message: &str,
    ) -> Result<OcsReply, reqwest::Error> {
        self.post(
            &format!("/activity.{}", format.as_str()),
            &[("message", message)],
        )
        .await
    }

    /// Read private data. `None` for `app` lists every app; `None` for
    /// `key` lists every key.
    pub async fn get_attribute(
        &self,
        format: Format,
        app: Option<&str>,
        key: Option<&str>,
    ) -> Result<OcsReply, reqwest::Error> {
        let path = match (app, key) {
            (Some(app), Some(key)) => format!(
                "/privatedata/getattribute/{}/{}.{}",
                encode(app),
                encode(key),
                format.as_str()
            ),
            (Some(app), None) => format!("/privatedata/getattribute/{}", encode(app)),
            (None, _) => "/privatedata/getattribute".to_string(),
        };
        self.get(&path, &[("format", format.as_str())]).await
    }

    pub async fn set_attribute(
        &self,
        format: Format,
        app: &str,
        key: &str,
        value: &str,
    ) -> Result<OcsReply, reqwest::Error> {
        let path = format!(
            "/privatedata/setattribute/{}/{}.{}",
            encode(app),
            encode(key),
            format.as_str()
        );
        self.post(&path, &[("value", value)]).await
    }

    pub async fn delete_attribute(
        &self,
        format: Format,
        app: &str,
        key: &str,
    ) -> Result<OcsReply, reqwest::Error> {
        let path = format!(
            "/privatedata/deleteattribute/{}/{}.{}",
            encode(app),
            encode(key),
            format.as_str()
        );
        self.post(&path, &[]).await
    }

    pub async fn quota(&self, format: Format, user: &str) -> Result<OcsReply, reqwest::Error> {
        self.get(&format!("/cloud/user/{}.{}", encode(user), format.as_str()), &[])
            .await
    }

    /// Set a quota. `None` omits the `quota` field.
    pub async fn set_quota(
        &self,
        format: Format,
        user: &str,
        quota: Option<i64>,
    ) -> Result<OcsReply, reqwest::Error> {
        let path = format!("/cloud/user/{}.{}", encode(user), format.as_str());
        let quota = quota.map(|q| q.to_string());
        let form: Vec<(&str, &str)> = quota.iter().map(|q| ("quota", q.as_str())).collect();
        self.post(&path, &form).await
    }

    /// GET `path` below the endpoint root with a query string.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<OcsReply, reqwest::Error> {
        let request = self.client.get(self.url(path)).query(query);
        self.send(request).await
    }

    /// POST `path` below the endpoint root with a form body.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<OcsReply, reqwest::Error> {
        let request = self.client.post(self.url(path)).form(form);
        self.send(request).await
    }

    /// Send an arbitrary method, e.g. to probe unsupported verbs.
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<OcsReply, reqwest::Error> {
        let request = self.client.request(method, self.url(path));
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<OcsReply, reqwest::Error> {
        let request = match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        };
        let response = request.send().await?;

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let www_authenticate = header(WWW_AUTHENTICATE);
        let status = response.status().as_u16();

        Ok(OcsReply {
            status,
            content_type,
            www_authenticate,
            body: response.text().await?,
        })
    }
}

/// Percent-encode one path segment.
fn encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
