use std::{
    fmt,
    path::{Path, PathBuf},
};

use magic_types::{Error, FilePart, Result, SessionConfig};
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{base, utils::request_url};

pub const NAMESPACE_HEADER: &str = "X-Namespace";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Pass as the query argument when a request has no query parameters.
pub const NO_QUERY: Option<&[(&str, &str)]> = None;

/// An HTTP session scoped to one base URL and namespace.
///
/// Each session owns its connection pool and cookie jar. Cookies set by the
/// server are sent back on later requests from the same session. Use
/// [`Session::fork`] to get an independent session for the same endpoint, for
/// example to log in as a different user.
pub struct Session {
    client: Client,
    base_url: String,
    namespace: String,
    token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session with no token and an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl ToString, namespace: impl ToString) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            namespace: namespace.to_string(),
            token: None,
        })
    }

    /// Session for `config`, with its token bound if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying HTTP client cannot be built.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let mut session = Self::new(&config.base_url, &config.namespace)?;
        if let Some(token) = config.token.as_ref() {
            session.bind_token(token);
        }
        Ok(session)
    }

    /// New session for the same base URL and namespace with its own client.
    /// Neither the bound token nor any cookies are carried over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying HTTP client cannot be built.
    pub fn fork(&self) -> Result<Self> {
        Self::new(&self.base_url, &self.namespace)
    }

    /// Sends `Authorization: Bearer <token>` on every later request.
    pub fn bind_token(&mut self, token: impl ToString) {
        self.token = Some(token.to_string());
    }

    /// Base URL that request paths are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value of the `X-Namespace` header.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The bound token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Headers attached to every request. An empty token counts as unbound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the namespace or token contains
    /// characters that are not allowed in a header value.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let namespace =
            HeaderValue::from_str(&self.namespace).map_err(|source| Error::InvalidHeader {
                name: NAMESPACE_HEADER,
                source,
            })?;
        headers.insert(HeaderName::from_static("x-namespace"), namespace);

        if let Some(token) = self.token.as_deref().filter(|token| !token.is_empty()) {
            let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|source| {
                Error::InvalidHeader {
                    name: AUTHORIZATION_HEADER,
                    source,
                }
            })?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = request_url(&self.base_url, path);
        debug!(%method, %url, "sending request");
        Ok(self.client.request(method, url).headers(self.headers()?))
    }

    fn request_with_query<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
    ) -> Result<RequestBuilder> {
        let rb = self.request(method, path)?;
        Ok(match query {
            Some(query) => rb.query(query),
            None => rb,
        })
    }

    fn request_with_body<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<RequestBuilder> {
        base::with_json_body(self.request(method, path)?, body)
    }

    fn upload_request<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        files: impl IntoIterator<Item = FilePart>,
        query: Option<&Q>,
    ) -> Result<RequestBuilder> {
        let form = base::multipart_form(files)?;
        Ok(self
            .request_with_query(Method::POST, path, query)?
            .multipart(form))
    }

    /// `GET {base_url}{path}`. Returns `Ok(None)` if the body is not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for an invalid namespace or token and
    /// [`Error::Http`] if the request fails to send.
    #[tracing::instrument(level = "debug", skip(self, query), fields(namespace = %self.namespace))]
    pub fn get<Q: Serialize + ?Sized>(&self, path: &str, query: Option<&Q>) -> Result<Option<Value>> {
        base::send_json_lenient(self.request_with_query(Method::GET, path, query)?)
    }

    /// `POST {base_url}{path}` with a JSON body. Returns `Ok(None)` if the
    /// response body is not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `body` cannot be serialized,
    /// [`Error::InvalidHeader`] for an invalid namespace or token and
    /// [`Error::Http`] if the request fails to send.
    #[tracing::instrument(level = "debug", skip(self, body), fields(namespace = %self.namespace))]
    pub fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Option<Value>> {
        base::send_json_lenient(self.request_with_body(Method::POST, path, body)?)
    }

    /// `PUT {base_url}{path}` with a JSON body. Returns `Ok(None)` if the
    /// response body is not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `body` cannot be serialized,
    /// [`Error::InvalidHeader`] for an invalid namespace or token and
    /// [`Error::Http`] if the request fails to send.
    #[tracing::instrument(level = "debug", skip(self, body), fields(namespace = %self.namespace))]
    pub fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Option<Value>> {
        base::send_json_lenient(self.request_with_body(Method::PUT, path, body)?)
    }

    /// `DELETE {base_url}{path}`. Returns `Ok(None)` if the body is not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for an invalid namespace or token and
    /// [`Error::Http`] if the request fails to send.
    #[tracing::instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    pub fn delete(&self, path: &str) -> Result<Option<Value>> {
        base::send_json_lenient(self.request(Method::DELETE, path)?)
    }

    /// Multipart `POST {base_url}{path}`, one part per file. Returns `Ok(None)`
    /// if the response body is not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if a part has an invalid mime type or the
    /// request fails to send, and [`Error::InvalidHeader`] for an invalid
    /// namespace or token.
    #[tracing::instrument(level = "debug", skip(self, files, query), fields(namespace = %self.namespace))]
    pub fn upload<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        files: impl IntoIterator<Item = FilePart>,
        query: Option<&Q>,
    ) -> Result<Option<Value>> {
        base::send_json_lenient(self.upload_request(path, files, query)?)
    }

    /// `GET {base_url}{path}` and write the raw body to `destination`,
    /// replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the request fails, [`Error::InvalidHeader`]
    /// for an invalid namespace or token and [`Error::Io`] if the file cannot
    /// be written.
    #[tracing::instrument(
        level = "debug",
        skip(self, destination, query),
        fields(namespace = %self.namespace, destination = %destination.as_ref().display())
    )]
    pub fn download<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        destination: impl AsRef<Path>,
        query: Option<&Q>,
    ) -> Result<PathBuf> {
        let response = base::send(self.request_with_query(Method::GET, path, query)?)?;
        let bytes = response.bytes()?;
        let destination = destination.as_ref();
        std::fs::write(destination, &bytes)?;
        debug!(len = bytes.len(), "wrote response body");
        Ok(destination.to_path_buf())
    }

    /// Like [`Session::get`], decoding the body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::get`], plus [`Error::Decode`] if the response body
    /// does not decode into `T`.
    pub fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        base::send_json(self.request_with_query(Method::GET, path, query)?)
    }

    /// Like [`Session::post`], decoding the body into `U`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::post`], plus [`Error::Decode`] if the response body
    /// does not decode into `U`.
    pub fn post_json<T, U>(&self, path: &str, body: &T) -> Result<U>
    where
        T: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        base::send_json(self.request_with_body(Method::POST, path, body)?)
    }

    /// Like [`Session::put`], decoding the body into `U`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::put`], plus [`Error::Decode`] if the response body
    /// does not decode into `U`.
    pub fn put_json<T, U>(&self, path: &str, body: &T) -> Result<U>
    where
        T: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        base::send_json(self.request_with_body(Method::PUT, path, body)?)
    }

    /// Like [`Session::delete`], decoding the body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::delete`], plus [`Error::Decode`] if the response body
    /// does not decode into `T`.
    pub fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        base::send_json(self.request(Method::DELETE, path)?)
    }

    /// Like [`Session::upload`], decoding the body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::upload`], plus [`Error::Decode`] if the response body
    /// does not decode into `T`.
    pub fn upload_json<T, Q>(
        &self,
        path: &str,
        files: impl IntoIterator<Item = FilePart>,
        query: Option<&Q>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        base::send_json(self.upload_request(path, files, query)?)
    }
}
