use magic_types::{Error, FilePart, Result};
use reqwest::{
    blocking::{multipart, RequestBuilder, Response},
    header::CONTENT_TYPE,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub(crate) fn send(rb: RequestBuilder) -> Result<Response> {
    let response = rb.send()?;
    debug!(status = %response.status(), "received response");
    Ok(response)
}

/// Sends the request and decodes the body as JSON, whatever the status code.
pub(crate) fn send_json<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T> {
    let body = send(rb)?.bytes()?;
    serde_json::from_slice(&body).map_err(Error::Decode)
}

/// Like [`send_json`], except that a body which fails to decode is logged and
/// reported as `None`. A body of `null` is `Some(Value::Null)`.
pub(crate) fn send_json_lenient(rb: RequestBuilder) -> Result<Option<Value>> {
    match send_json::<Value>(rb) {
        Ok(value) => Ok(Some(value)),
        Err(Error::Decode(error)) => {
            warn!(%error, "response body is not valid JSON");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

pub(crate) fn with_json_body<T: Serialize + ?Sized>(
    rb: RequestBuilder,
    body: &T,
) -> Result<RequestBuilder> {
    let body = serde_json::to_vec(body).map_err(Error::Encode)?;
    Ok(rb.header(CONTENT_TYPE, "application/json").body(body))
}

pub(crate) fn multipart_form(files: impl IntoIterator<Item = FilePart>) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for file in files {
        let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.mime.as_deref() {
            part = part.mime_str(mime)?;
        }
        form = form.part(file.field, part);
    }
    Ok(form)
}
