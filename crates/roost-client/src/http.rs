//! Base request client: one API origin, the credential triple attached on
//! the way out, the refreshed triple absorbed on the way back.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use roost_types::headers;

use crate::error::ClientError;
use crate::messages;
use crate::session::{Credentials, SessionStore};

pub struct ApiClient {
    http: reqwest::Client,
    origin: String,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(origin: impl Into<String>, session: Arc<dyn SessionStore>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self {
            http: reqwest::Client::new(),
            origin,
            session,
        }
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.get(self.url(path))).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.delete(self.url(path))).await
    }

    pub(crate) async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    pub(crate) async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.post(self.url(path)).multipart(form))
            .await
    }

    pub(crate) async fn put_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response, ClientError> {
        self.execute(self.http.put(self.url(path)).multipart(form))
            .await
    }

    async fn execute(
        &self,
        mut req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        if let Some(creds) = self.session.load() {
            req = req
                .header(headers::ACCESS_TOKEN, creds.access_token)
                .header(headers::CLIENT, creds.client)
                .header(headers::UID, creds.uid);
        }

        let res = req.send().await?;
        self.absorb_triple(&res);

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status().as_u16();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Err(ClientError::Rejected {
            status,
            errors: parse_errors(&body),
            message: messages::BAD_REQUEST.to_string(),
        })
    }

    /// Overwrite the stored triple when the response carries a renewed one.
    /// All three headers or nothing; a partial set is never persisted.
    fn absorb_triple(&self, res: &reqwest::Response) {
        let header = |name: &str| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        if let (Some(access_token), Some(client), Some(uid)) = (
            header(headers::ACCESS_TOKEN),
            header(headers::CLIENT),
            header(headers::UID),
        ) {
            self.session.save(&Credentials {
                access_token,
                client,
                uid,
            });
        }
    }
}

/// Pull the server's error set out of either shape it uses:
/// `{"errors": [..]}` or `{"errors": {"full_messages": [..]}}`.
fn parse_errors(body: &Value) -> Vec<String> {
    let errors = match body.get("errors") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => match map.get("full_messages") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    errors
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect()
}
