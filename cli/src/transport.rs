use todo_sync_core::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Blocking transport backed by a ureq agent.
///
/// 4xx/5xx responses come back as data; only failures to get any response
/// become `TransportError`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, request.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&request.path), &request.headers).call(),
            (HttpMethod::Delete, _) => {
                with_headers(self.agent.delete(&request.path), &request.headers).call()
            }
            (HttpMethod::Post, body) => with_headers(self.agent.post(&request.path), &request.headers)
                .send(body.unwrap_or_default().as_bytes()),
            (HttpMethod::Put, body) => with_headers(self.agent.put(&request.path), &request.headers)
                .send(body.unwrap_or_default().as_bytes()),
        };
        let mut response = result.map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}
