use anyhow::Context;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing as log;

/// Finds the token in the user's environment, panicking if no suitable token
/// can be found.
pub fn default_token_from_env() -> SecretString {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GITHUB_API_TOKEN"))
        .expect("could not find token in GITHUB_TOKEN or GITHUB_API_TOKEN")
        .into()
}

#[derive(Clone)]
pub struct GithubClient {
    token: SecretString,
    client: Client,
    api_url: String,
    raw_url: String,
}

impl GithubClient {
    pub fn new(token: SecretString, api_url: String, raw_url: String) -> Self {
        GithubClient {
            client: Client::new(),
            token,
            api_url,
            raw_url,
        }
    }

    pub fn new_from_env() -> Self {
        Self::new(
            default_token_from_env(),
            std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            std::env::var("GITHUB_RAW_URL")
                .unwrap_or_else(|_| "https://raw.githubusercontent.com".to_string()),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn raw(&self) -> &Client {
        &self.client
    }

    pub(crate) async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<(Bytes, String)> {
        log::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("building reqwest {req_dbg}"))?;

        let resp = self.client.execute(req).await?;
        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok((body, req_dbg))
    }

    pub async fn json<T>(&self, req: RequestBuilder) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let (body, _req_dbg) = self.send_req(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        log::trace!("get {:?}", url);
        self.client.get(url).configure(self)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        log::trace!("post {:?}", url);
        self.client.post(url).configure(self)
    }

    /// Fetches a file from the raw content host, `None` if it does not exist.
    pub async fn raw_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> anyhow::Result<Option<Bytes>> {
        let url = format!("{}/{repo}/{branch}/{path}", self.raw_url);
        let req = self.get(&url);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("failed to build request {req_dbg:?}"))?;
        let resp = self.raw().execute(req).await.context(req_dbg.clone())?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        match status {
            StatusCode::OK => Ok(Some(body)),
            StatusCode::NOT_FOUND => Ok(None),
            status => anyhow::bail!("failed to GET {}: {}", url, status),
        }
    }
}

trait RequestSend: Sized {
    fn configure(self, g: &GithubClient) -> Self;
}

impl RequestSend for RequestBuilder {
    fn configure(self, g: &GithubClient) -> RequestBuilder {
        let mut auth = reqwest::header::HeaderValue::from_maybe_shared(format!(
            "token {}",
            g.token.expose_secret()
        ))
        .unwrap();
        auth.set_sensitive(true);
        self.header(USER_AGENT, "assignbot").header(AUTHORIZATION, &auth)
    }
}
