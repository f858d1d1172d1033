//! [`PageDriver`] over the W3C WebDriver HTTP protocol (chromedriver or any
//! compliant endpoint).

use std::time::Duration;

use async_trait::async_trait;
use profdb_core::ControlLocator;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::protocol::{
    chrome_capabilities, element_id, element_reference, Envelope, ErrorValue, NewSession,
    SCROLL_SCRIPT,
};
use super::{Element, PageDriver};
use crate::error::ScraperError;

/// Settings for [`WebDriverSession::start`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    /// Ceiling on each HTTP call to the WebDriver endpoint.
    pub request_timeout: Duration,
    /// Browser-side page-load timeout.
    pub page_load_timeout: Duration,
}

/// A live browser session. Call [`WebDriverSession::close`] on every exit
/// path; the browser process outlives a dropped handle.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

/// Why a single WebDriver command failed.
enum CommandFailure {
    /// The endpoint answered with a W3C error code.
    Protocol { code: String, message: String },
    /// Transport or decoding failure before a W3C answer was available.
    Transport(ScraperError),
}

fn is_session_code(code: &str) -> bool {
    matches!(code, "invalid session id" | "session not created")
}

impl CommandFailure {
    /// Maps protocol failures through `on_protocol`, keeping session-level
    /// codes and transport failures as they are.
    fn into_error(self, on_protocol: impl FnOnce(String, String) -> ScraperError) -> ScraperError {
        match self {
            CommandFailure::Protocol { code, message } if is_session_code(&code) => {
                ScraperError::Session(format!("{code}: {message}"))
            }
            CommandFailure::Protocol { code, message } => on_protocol(code, message),
            CommandFailure::Transport(err) => err,
        }
    }
}

async fn send<T: DeserializeOwned>(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<T, CommandFailure> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| CommandFailure::Transport(e.into()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| CommandFailure::Transport(e.into()))?;

    if !status.is_success() {
        let failure = serde_json::from_str::<Envelope<ErrorValue>>(&text).map_or_else(
            |_| ErrorValue {
                error: format!("http status {}", status.as_u16()),
                message: text.clone(),
            },
            |envelope| envelope.value,
        );
        return Err(CommandFailure::Protocol {
            code: failure.error,
            message: failure.message,
        });
    }

    serde_json::from_str::<Envelope<T>>(&text)
        .map(|envelope| envelope.value)
        .map_err(|source| {
            CommandFailure::Transport(ScraperError::Deserialize {
                context: format!("webdriver response from {url}"),
                source,
            })
        })
}

impl WebDriverSession {
    /// Opens a new Chrome session and applies the page-load timeout.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] if the endpoint is unreachable.
    /// - [`ScraperError::Session`] if the endpoint refuses the session or the
    ///   timeouts.
    pub async fn start(options: &SessionOptions) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = options.webdriver_url.trim_end_matches('/').to_owned();

        let capabilities = chrome_capabilities(options.headless, &options.user_agent);
        let created: NewSession = send(
            &client,
            Method::POST,
            &format!("{base_url}/session"),
            Some(&capabilities),
        )
        .await
        .map_err(|f| {
            f.into_error(|code, message| ScraperError::Session(format!("{code}: {message}")))
        })?;

        let session = Self {
            client,
            base_url,
            session_id: created.session_id,
        };

        if let Err(err) = session.set_page_load_timeout(options.page_load_timeout).await {
            session.close().await.ok();
            return Err(err);
        }

        tracing::info!(
            session_id = %session.session_id,
            headless = options.headless,
            "webdriver session started"
        );
        Ok(session)
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ends the browser session.
    ///
    /// # Errors
    ///
    /// Transport failures or a W3C error from the endpoint.
    pub async fn close(&self) -> Result<(), ScraperError> {
        self.command::<Value>(Method::DELETE, "", None)
            .await
            .map(drop)
            .map_err(|f| {
                f.into_error(|code, message| ScraperError::Session(format!("{code}: {message}")))
            })?;
        tracing::info!(session_id = %self.session_id, "webdriver session closed");
        Ok(())
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<(), ScraperError> {
        #[allow(clippy::cast_possible_truncation)]
        let page_load_ms = timeout.as_millis() as u64;
        let body = json!({ "pageLoad": page_load_ms });
        self.command::<Value>(Method::POST, "timeouts", Some(&body))
            .await
            .map(drop)
            .map_err(|f| {
                f.into_error(|code, message| ScraperError::Session(format!("{code}: {message}")))
            })
    }

    fn session_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/session/{}", self.base_url, self.session_id)
        } else {
            format!("{}/session/{}/{path}", self.base_url, self.session_id)
        }
    }

    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, CommandFailure> {
        send(&self.client, method, &self.session_url(path), body).await
    }

    async fn element_text(&self, id: &str) -> Option<String> {
        self.command::<String>(Method::GET, &format!("element/{id}/text"), None)
            .await
            .ok()
    }

    async fn element_displayed(&self, id: &str) -> bool {
        self.command::<bool>(Method::GET, &format!("element/{id}/displayed"), None)
            .await
            .unwrap_or(false)
    }
}

#[async_trait]
impl PageDriver for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        let body = json!({ "url": url });
        let result = self.command::<Value>(Method::POST, "url", Some(&body)).await;
        match result {
            Ok(_) => Ok(()),
            Err(CommandFailure::Transport(ScraperError::Http(err))) if err.is_timeout() => {
                Err(ScraperError::Navigation {
                    url: url.to_owned(),
                    reason: format!("request timed out: {err}"),
                })
            }
            Err(failure) => Err(failure.into_error(|code, message| ScraperError::Navigation {
                url: url.to_owned(),
                reason: format!("{code}: {message}"),
            })),
        }
    }

    async fn find(&self, locator: &ControlLocator) -> Result<Option<Element>, ScraperError> {
        let body = json!({ "using": "css selector", "value": locator.css });
        let references: Vec<Value> =
            match self.command(Method::POST, "elements", Some(&body)).await {
                Ok(references) => references,
                Err(CommandFailure::Protocol { code, .. }) if code == "no such element" => {
                    return Ok(None)
                }
                Err(CommandFailure::Protocol { code, message }) if code == "invalid selector" => {
                    return Err(ScraperError::InvalidSelector {
                        selector: locator.css.clone(),
                        reason: message,
                    })
                }
                Err(failure) => {
                    return Err(failure.into_error(|code, message| ScraperError::Interaction {
                        target: locator.to_string(),
                        reason: format!("{code}: {message}"),
                    }))
                }
            };

        let wanted = locator.text.as_deref().map(str::to_lowercase);
        for id in references.iter().filter_map(element_id) {
            if let Some(wanted) = &wanted {
                // stale or detached elements have no readable text
                let Some(text) = self.element_text(&id).await else {
                    continue;
                };
                if !text.to_lowercase().contains(wanted.as_str()) {
                    continue;
                }
            }
            if self.element_displayed(&id).await {
                return Ok(Some(Element {
                    id,
                    label: locator.to_string(),
                }));
            }
        }
        Ok(None)
    }

    async fn click(&self, element: &Element) -> Result<(), ScraperError> {
        let path = format!("element/{}/click", element.id);
        self.command::<Value>(Method::POST, &path, Some(&json!({})))
            .await
            .map(drop)
            .map_err(|f| {
                f.into_error(|code, message| ScraperError::Interaction {
                    target: element.label.clone(),
                    reason: format!("{code}: {message}"),
                })
            })
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), ScraperError> {
        let body = json!({
            "script": SCROLL_SCRIPT,
            "args": [element_reference(&element.id)],
        });
        self.command::<Value>(Method::POST, "execute/sync", Some(&body))
            .await
            .map(drop)
            .map_err(|f| {
                f.into_error(|code, message| ScraperError::Interaction {
                    target: element.label.clone(),
                    reason: format!("{code}: {message}"),
                })
            })
    }

    async fn page_source(&self) -> Result<String, ScraperError> {
        self.command::<String>(Method::GET, "source", None)
            .await
            .map_err(|f| {
                f.into_error(|code, message| ScraperError::Session(format!("{code}: {message}")))
            })
    }
}
