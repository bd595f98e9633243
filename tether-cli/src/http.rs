//! Blocking HTTP transport.
//!
//! ```text
//! GET    {base}/owners/{owner}/relations            (Link rel="next" paging)
//! PUT    {base}/owners/{owner}/relations/{target}   body: wire relation
//! DELETE {base}/owners/{owner}/relations/{target}
//! ```

use std::collections::HashSet;
use std::time::Duration;

use tether_core::{codec, OwnerId, Relation, TargetId, WireRelation};
use tether_sync::{Transport, TransportError};

pub struct HttpTransport {
    agent: ureq::Agent,
    base: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base: base.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn relations_url(&self, owner: &OwnerId) -> String {
        format!("{}/owners/{}/relations", self.base, encode_segment(&owner.0))
    }

    fn relation_url(&self, owner: &OwnerId, target_id: &TargetId) -> String {
        format!(
            "{}/{}",
            self.relations_url(owner),
            encode_segment(&target_id.0)
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, url)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl Transport for HttpTransport {
    fn create_or_update(
        &mut self,
        owner: &OwnerId,
        relation: &Relation,
    ) -> Result<(), TransportError> {
        let body = serde_json::to_value(codec::encode(relation))
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        self.request("PUT", &self.relation_url(owner, &relation.target_id))
            .send_json(body)
            .map_err(classify)?;
        Ok(())
    }

    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError> {
        self.request("DELETE", &self.relation_url(owner, target_id))
            .call()
            .map_err(classify)?;
        Ok(())
    }

    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError> {
        let mut relations = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.relations_url(owner));

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(TransportError::Malformed(format!(
                    "pagination loop: {url} was already fetched"
                )));
            }
            let response = self.request("GET", &url).call().map_err(classify)?;
            next = response.header("link").and_then(next_link);

            let page: Vec<WireRelation> = response
                .into_json()
                .map_err(|e| TransportError::Malformed(e.to_string()))?;
            let decoded =
                codec::decode_all(page).map_err(|e| TransportError::Malformed(e.to_string()))?;
            tracing::debug!("{owner}: fetched page of {} relation(s)", decoded.len());
            relations.extend(decoded);
        }

        Ok(relations)
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(404, _) => TransportError::NotFound,
        ureq::Error::Status(status, response) => TransportError::Rejected {
            status,
            message: response.into_string().unwrap_or_default().trim().to_string(),
        },
        ureq::Error::Transport(transport) => TransportError::Unavailable(transport.to_string()),
    }
}

/// Target of the `rel="next"` entry of a `Link` header, if any.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
