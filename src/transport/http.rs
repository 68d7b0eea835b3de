use super::Transport;
use crate::errors::{check, TransportError};
use crate::query::QueryParameters;
use crate::types::ApiUrl;
use async_trait::async_trait;
use camino::Utf8Path;
use fs_err::tokio::{File, OpenOptions};
use futures::TryStreamExt;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde_json::Value;
use tokio_util::codec::{BytesCodec, FramedRead};
use tokio_util::io::StreamReader;

/// [Transport] over HTTP, for a Cytomine server at a given [ApiUrl].
///
/// Authentication is not done here: Cytomine requests are signed with the
/// user's keys by a middleware given to [HttpTransportBuilder::with].
#[derive(Clone)]
pub struct HttpTransport {
    client: ClientWithMiddleware,
    url: ApiUrl,
}

pub struct HttpTransportBuilder {
    url: ApiUrl,
    builder: reqwest_middleware::ClientBuilder,
}

impl HttpTransportBuilder {
    pub(crate) fn new(url: ApiUrl) -> Result<Self, reqwest::Error> {
        let client = reqwest::ClientBuilder::new()
            .default_headers(accept_json())
            .build()?;
        let builder = reqwest_middleware::ClientBuilder::new(client);
        Ok(Self { url, builder })
    }

    /// Add middleware to the HTTP client.
    pub fn with<M: reqwest_middleware::Middleware>(self, middleware: M) -> Self {
        Self {
            url: self.url,
            builder: self.builder.with(middleware),
        }
    }

    pub fn build(self) -> HttpTransport {
        HttpTransport {
            client: self.builder.build(),
            url: self.url,
        }
    }
}

impl HttpTransport {
    /// Create a transport builder.
    pub fn build(url: ApiUrl) -> Result<HttpTransportBuilder, reqwest::Error> {
        HttpTransportBuilder::new(url)
    }

    /// Get the API base URL.
    pub fn url(&self) -> &ApiUrl {
        &self.url
    }
}

fn accept_json() -> HeaderMap {
    HeaderMap::from_iter([(ACCEPT, HeaderValue::from_static("application/json"))])
}

fn with_json(req: RequestBuilder, body: &Value) -> RequestBuilder {
    req.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body.to_string())
}

async fn json_or_null(res: reqwest::Response) -> Result<Value, TransportError> {
    let text = check(res).await?.text().await?;
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e, text))
    }
}

async fn write_body(res: reqwest::Response, file: &mut File) -> Result<(), TransportError> {
    let stream = check(res)
        .await?
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::ConnectionAborted, e));
    let mut reader = StreamReader::new(stream);
    tokio::io::copy(&mut reader, file).await?;
    Ok(())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, uri: &str, query: &QueryParameters) -> Result<Value, TransportError> {
        let url = self.url.join(uri);
        debug!("GET {} {:?}", url, query);
        let res = self.client.get(url).query(query).send().await?;
        json_or_null(res).await
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<&Value>,
        query: &QueryParameters,
    ) -> Result<Value, TransportError> {
        let url = self.url.join(uri);
        debug!("POST {} {:?}", url, query);
        let mut req = self.client.post(url).query(query);
        if let Some(body) = body {
            req = with_json(req, body);
        }
        let res = req.send().await?;
        json_or_null(res).await
    }

    async fn put(&self, uri: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url.join(uri);
        debug!("PUT {}", url);
        let res = with_json(self.client.put(url), body).send().await?;
        json_or_null(res).await
    }

    async fn delete(&self, uri: &str) -> Result<(), TransportError> {
        let url = self.url.join(uri);
        debug!("DELETE {}", url);
        let res = self.client.delete(url).send().await?;
        check(res).await?;
        Ok(())
    }

    async fn download_file(
        &self,
        uri: &str,
        destination: &Utf8Path,
        overwrite: bool,
        query: &QueryParameters,
    ) -> Result<(), TransportError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_str().is_empty()) {
            fs_err::tokio::create_dir_all(parent).await?;
        }
        let mut file = if overwrite {
            File::create(destination).await
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(destination)
                .await
        }?;
        let url = self.url.join(uri);
        debug!("GET {} -> {}", url, destination);
        let result: Result<(), TransportError> = async {
            let res = self.client.get(url).query(query).send().await?;
            write_body(res, &mut file).await
        }
        .await;
        if result.is_err() {
            drop(file);
            if let Err(e) = fs_err::tokio::remove_file(destination).await {
                log::warn!("incomplete download left behind: {}", e);
            }
        }
        result
    }

    async fn upload_file(
        &self,
        uri: &str,
        file: &Utf8Path,
        query: &QueryParameters,
    ) -> Result<Value, TransportError> {
        // https://github.com/seanmonstar/reqwest/issues/646#issuecomment-616985015
        let filename = file
            .file_name()
            .ok_or_else(|| TransportError::Path(file.to_string()))?
            .to_string();
        let content_length = fs_err::tokio::metadata(file).await?.len();
        let reader = File::open(file).await?;
        let body = Body::wrap_stream(FramedRead::new(reader, BytesCodec::new()));
        let form = Form::new().part(
            "files[]",
            Part::stream_with_length(body, content_length).file_name(filename),
        );
        let url = self.url.join(uri);
        debug!("POST {} <- {}", url, file);
        let res = self
            .client
            .post(url)
            .query(query)
            .multipart(form)
            .send()
            .await?;
        json_or_null(res).await
    }
}
