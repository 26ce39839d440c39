use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode, Url};

use super::{SourceKey, TextSource, TextUnit};
use crate::error::{MashError, Result};

/// Text source backed by a JSON endpoint.
///
/// `GET {base_url}/{key}?count={count}` must answer with a JSON array of
/// strings. A 404 means the key does not exist.
#[derive(Debug, Clone)]
pub struct HttpSource {
	base_url: Url,
	client: Client,
}

impl HttpSource {
	/// Creates a source with a reusable client and a request timeout.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
		let base_url = Url::parse(base_url).map_err(|e| MashError::invalid(format!("base_url {base_url:?}: {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(MashError::invalid(format!("base_url {base_url} cannot be a base")));
		}
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| MashError::invalid(format!("http client: {e}")))?;
		Ok(Self { base_url, client })
	}

	/// URL of the units of `key`, with the key as one escaped path segment.
	fn url_for(&self, key: &SourceKey) -> Url {
		let mut url = self.base_url.clone();
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().push(key.as_str());
		}
		url
	}
}

impl TextSource for HttpSource {
	async fn fetch_units(&self, key: &SourceKey, count: usize) -> Result<Vec<TextUnit>> {
		let url = self.url_for(key);
		debug!("requesting {count} units for {key} from {url}");

		let response = self
			.client
			.get(url)
			.query(&[("count", count)])
			.send()
			.await
			.map_err(|e| MashError::unavailable(key, e))?;

		if response.status() == StatusCode::NOT_FOUND {
			return Err(MashError::SourceNotFound { key: key.to_string() });
		}

		let mut units: Vec<TextUnit> = response
			.error_for_status()
			.map_err(|e| MashError::unavailable(key, e))?
			.json()
			.await
			.map_err(|e| MashError::unavailable(key, e))?;

		// Endpoints are free to ignore `count`.
		units.truncate(count);
		Ok(units)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;

	/// Serves one canned response per connection, chosen by the last path segment.
	async fn serve_units() -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			loop {
				let Ok((mut stream, _)) = listener.accept().await else { return };
				tokio::spawn(async move {
					let mut request = Vec::new();
					let mut buf = [0u8; 1024];
					while !request.windows(4).any(|w| w == b"\r\n\r\n") {
						match stream.read(&mut buf).await {
							Ok(0) | Err(_) => return,
							Ok(read) => request.extend_from_slice(&buf[..read]),
						}
					}
					let request = String::from_utf8_lossy(&request);
					let path = request.split_whitespace().nth(1).unwrap_or("");

					let (status, body) = if path.starts_with("/units/many?") {
						("200 OK", r#"["one","two","three","four"]"#)
					} else if path.starts_with("/units/broken?") {
						("500 Internal Server Error", "oops")
					} else if path.starts_with("/units/garbled?") {
						("200 OK", "<html>not json</html>")
					} else {
						("404 Not Found", "")
					};
					let response = format!(
						"HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
						body.len()
					);
					let _ = stream.write_all(response.as_bytes()).await;
					let _ = stream.shutdown().await;
				});
			}
		});

		format!("http://{addr}/units")
	}

	#[tokio::test]
	async fn responses_map_to_units_or_errors() {
		let base_url = serve_units().await;
		let source = HttpSource::new(&base_url, Duration::from_secs(5)).unwrap();
		let key = |name: &str| SourceKey::new(name).unwrap();

		// Extra units sent by the endpoint are dropped
		let units = source.fetch_units(&key("many"), 2).await.unwrap();
		assert_eq!(units, vec!["one", "two"]);

		assert_eq!(
			source.fetch_units(&key("@ghost"), 2).await,
			Err(MashError::SourceNotFound { key: "@ghost".into() })
		);
		assert!(matches!(
			source.fetch_units(&key("broken"), 2).await,
			Err(MashError::SourceUnavailable { .. })
		));
		assert!(matches!(
			source.fetch_units(&key("garbled"), 2).await,
			Err(MashError::SourceUnavailable { .. })
		));

		assert!(source.verify(&key("many")).await.is_ok());
		assert!(matches!(source.verify(&key("ghost")).await, Err(MashError::SourceNotFound { .. })));
	}

	#[test]
	fn key_is_appended_as_one_segment() {
		let source = HttpSource::new("http://localhost:8080/api/units/", Duration::from_secs(1)).unwrap();
		let url = source.url_for(&SourceKey::new("@some one").unwrap());
		assert_eq!(url.as_str(), "http://localhost:8080/api/units/some%20one");

		let source = HttpSource::new("http://localhost:8080/api/units", Duration::from_secs(1)).unwrap();
		let url = source.url_for(&SourceKey::new("a/b").unwrap());
		assert_eq!(url.as_str(), "http://localhost:8080/api/units/a%2Fb");
	}

	#[test]
	fn rejects_non_base_urls() {
		assert!(HttpSource::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
		assert!(HttpSource::new("not a url", Duration::from_secs(1)).is_err());
	}

	#[tokio::test]
	async fn unreachable_host_is_unavailable() {
		let source = HttpSource::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
		let result = source.fetch_units(&SourceKey::new("alice").unwrap(), 3).await;
		assert!(matches!(result, Err(MashError::SourceUnavailable { .. })));
	}
}
