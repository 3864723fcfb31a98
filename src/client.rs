use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tokio::time::{sleep, timeout_at, Instant};

use crate::{
    options::TOKEN_ENV,
    retry::RetryPolicy,
    transport::{BoxError, HttpRequest, Transport},
    ApiRequest, ClientOptions, CompanyCamError, Query, ReqwestTransport, Result,
};

/// Authenticated client for the CompanyCam REST API.
///
/// Cheap to clone; clones share the underlying transport and connection pool.
pub struct CompanyCamClient<T: Transport = ReqwestTransport> {
    transport: Arc<T>,
    authorization: HeaderValue,
    options: ClientOptions,
}

impl<T: Transport> Clone for CompanyCamClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            authorization: self.authorization.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for CompanyCamClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanyCamClient")
            .field("token", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

/// Why an attempt is worth repeating.
enum Retryable {
    Transport(BoxError),
    RateLimited(String),
}

impl Retryable {
    #[cfg(feature = "tracing")]
    fn reason(&self) -> String {
        match self {
            Self::Transport(err) => format!("transport failure: {err}"),
            Self::RateLimited(_) => "rate limited".to_owned(),
        }
    }
}

impl CompanyCamClient<ReqwestTransport> {
    /// Creates a client with default options.
    ///
    /// The token may be given with or without the `Bearer ` prefix. Fails
    /// with [`CompanyCamError::Config`] when it is empty.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        Self::with_transport(token, ClientOptions::default(), ReqwestTransport::new())
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `COMPANYCAM_API_TOKEN` (required) plus the optional overrides
    /// documented on [`ClientOptions::from_env`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use companycam_http::CompanyCamClient;
    ///
    /// let client = CompanyCamClient::from_env().expect("COMPANYCAM_API_TOKEN must be set");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV).unwrap_or_default();
        let options = ClientOptions::from_lookup(&lookup)?;
        Self::with_transport(token, options, ReqwestTransport::new())
    }
}

impl<T: Transport> CompanyCamClient<T> {
    /// Creates a client over an arbitrary [`Transport`].
    ///
    /// The token and base URL are validated before the transport is stored,
    /// so a failed construction never reaches the network.
    pub fn with_transport(token: impl AsRef<str>, options: ClientOptions, transport: T) -> Result<Self> {
        let authorization = bearer_authorization(token.as_ref())?;
        validate_base_url(&options.base_url)?;

        Ok(Self {
            transport: Arc::new(transport),
            authorization,
            options,
        })
    }

    /// Applies client options such as base URL, timeout and retry behavior.
    ///
    /// Fails with [`CompanyCamError::Config`] when the base URL does not parse.
    pub fn with_options(mut self, opts: ClientOptions) -> Result<Self> {
        validate_base_url(&opts.base_url)?;
        self.options = opts;
        Ok(self)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Issues a GET with the given query parameters.
    pub async fn get<Q: Into<Query>>(&self, path: &str, query: Q) -> Result<Value> {
        self.send(ApiRequest::get(path).query(query)).await
    }

    /// Issues a POST with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(ApiRequest::post(path, to_json(path, body)?)).await
    }

    /// Issues a PUT with a JSON body.
    ///
    /// The body replaces the resource; send the complete desired state.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(ApiRequest::put(path, to_json(path, body)?)).await
    }

    /// Issues a DELETE. Any success body is discarded.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Sends a request, retrying transport failures and HTTP 429.
    ///
    /// At most `max_retries + 1` requests are sent. Other non-success
    /// statuses fail immediately with [`CompanyCamError::Api`].
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            deadline,
        } = request;

        let url = self.build_url(&path, &query)?;
        let body = body
            .map(|value| serde_json::to_vec(&value))
            .transpose()
            .map_err(|err| CompanyCamError::InvalidInput(format!("unserializable body for {path}: {err}")))?;
        let headers = self.headers(body.is_some());
        let policy = RetryPolicy::from_options(&self.options);
        let timeout = Duration::from_millis(self.options.timeout_ms);

        let mut attempt = 0usize;
        loop {
            let http_request = HttpRequest {
                method: method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
                timeout,
            };

            let outcome = match deadline {
                Some(deadline) => timeout_at(deadline, self.transport.send(http_request))
                    .await
                    .map_err(|_| CompanyCamError::DeadlineExceeded {
                        path: path.clone(),
                        attempts: attempt + 1,
                    })?,
                None => self.transport.send(http_request).await,
            };

            let retryable = match outcome {
                Ok(response) if response.status.is_success() => {
                    return decode_body(&path, &response.body);
                }
                Ok(response) if response.status == StatusCode::TOO_MANY_REQUESTS => {
                    Retryable::RateLimited(response.body)
                }
                Ok(response) => {
                    return Err(CompanyCamError::Api {
                        status: response.status.as_u16(),
                        body: response.body,
                        path,
                    });
                }
                Err(err) => Retryable::Transport(err),
            };

            if !policy.can_retry(attempt) {
                #[cfg(feature = "tracing")]
                tracing::warn!(%path, attempts = policy.max_attempts(), "retries exhausted");

                return Err(match retryable {
                    Retryable::Transport(err) => CompanyCamError::Transport(err),
                    Retryable::RateLimited(body) => CompanyCamError::RateLimited {
                        path,
                        attempts: policy.max_attempts(),
                        body,
                    },
                });
            }

            let delay = match &retryable {
                Retryable::Transport(_) => policy.backoff(attempt),
                Retryable::RateLimited(_) => policy.rate_limit_backoff(attempt),
            };
            if deadline.is_some_and(|deadline| wakes_past(deadline, delay)) {
                return Err(CompanyCamError::DeadlineExceeded {
                    path,
                    attempts: attempt + 1,
                });
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                %path,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %retryable.reason(),
                "retrying request"
            );

            sleep(delay).await;
            attempt += 1;
        }
    }

    fn build_url(&self, path: &str, query: &Query) -> Result<Url> {
        let base = self.options.base_url.trim_end_matches('/');
        let relative = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{relative}"))
            .map_err(|err| CompanyCamError::Config(format!("invalid url for path '{path}': {err}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                query
                    .pairs()
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }

    fn headers(&self, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    Url::parse(base_url)
        .map(|_| ())
        .map_err(|err| CompanyCamError::Config(format!("invalid base url '{base_url}': {err}")))
}

/// Whether sleeping `delay` from now would reach `deadline`. An instant too
/// far out to represent counts as past it.
fn wakes_past(deadline: Instant, delay: Duration) -> bool {
    Instant::now()
        .checked_add(delay)
        .map_or(true, |wake| wake >= deadline)
}

fn to_json<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|err| CompanyCamError::InvalidInput(format!("unserializable body for {path}: {err}")))
}

fn decode_body(path: &str, body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| {
        CompanyCamError::Decode(format!("invalid JSON from {path}: {err}; body: {body}"))
    })
}

fn bearer_authorization(token: &str) -> Result<HeaderValue> {
    let trimmed = token.trim();
    let bare = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        None if trimmed.eq_ignore_ascii_case("bearer") => "",
        _ => trimmed,
    };
    if bare.is_empty() {
        return Err(CompanyCamError::Config(format!(
            "{TOKEN_ENV} is not set. Generate a token at app.companycam.com/access_tokens"
        )));
    }

    let mut value = HeaderValue::from_str(&format!("Bearer {bare}"))
        .map_err(|_| CompanyCamError::Config("token contains characters not allowed in a header".to_owned()))?;
    value.set_sensitive(true);
    Ok(value)
}
