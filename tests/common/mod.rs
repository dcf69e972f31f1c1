//! Hub API mocks shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;

pub const KEY: &str = "test-connection-key";
pub const ENTITY_ID: &str = "abc123";

/// Status codes the mocked hub answers with.
#[derive(Debug, Clone, Copy)]
pub struct HubScript {
    pub auth: u16,
    pub prepare: u16,
    pub transfer: u16,
    pub finalize: u16,
}

impl Default for HubScript {
    fn default() -> Self {
        Self {
            auth: 200,
            prepare: 200,
            transfer: 200,
            finalize: 200,
        }
    }
}

pub struct HubMocks<'a> {
    pub auth: Mock<'a>,
    pub me: Mock<'a>,
    pub prepare: Mock<'a>,
    pub transfer: Mock<'a>,
    pub finalize: Mock<'a>,
}

impl HubMocks<'_> {
    /// Total calls across every endpoint.
    pub fn total_hits(&self) -> usize {
        self.auth.hits() + self.me.hits() + self.prepare.hits() + self.transfer.hits()
            + self.finalize.hits()
    }
}

pub fn mock_hub(server: &MockServer, script: HubScript) -> HubMocks<'_> {
    let bearer = format!("Bearer {KEY}");

    let auth = server.mock(|when, then| {
        when.method(GET).path("/auth").header("authorization", bearer.as_str());
        then.status(script.auth);
    });
    let me = server.mock(|when, then| {
        when.method(GET).path("/v1/me").header("authorization", bearer.as_str());
        then.status(200).json_body(json!({
            "id": "u1",
            "username": "tim",
            "author_url": "https://hub.anythingllm.com/u/tim"
        }));
    });
    let prepare = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/agent-skill/prepare")
            .header("authorization", bearer.as_str());
        if script.prepare == 200 {
            then.status(200).json_body(json!({
                "signedUrl": server.url(format!("/storage/{ENTITY_ID}")),
                "uri": format!("gs://hub-uploads/{ENTITY_ID}.zip"),
                "entityId": ENTITY_ID
            }));
        } else {
            then.status(script.prepare)
                .json_body(json!({ "error": "registration refused" }));
        }
    });
    let transfer = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("/storage/{ENTITY_ID}"))
            .header("content-type", "application/zip");
        then.status(script.transfer);
    });
    let finalize = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/agent-skill/finalize/{ENTITY_ID}"))
            .header("authorization", bearer.as_str());
        then.status(script.finalize);
    });

    HubMocks {
        auth,
        me,
        prepare,
        transfer,
        finalize,
    }
}

/// Write a logged-in session file.
pub fn write_session(path: &Path) {
    let session = json!({
        "connectionKey": KEY,
        "userInfo": {
            "id": "u1",
            "username": "tim",
            "author_url": "https://hub.anythingllm.com/u/tim"
        }
    });
    std::fs::write(path, serde_json::to_string_pretty(&session).unwrap()).unwrap();
}

/// Whether `dir` has no entries.
pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).map_or(true, |mut entries| entries.next().is_none())
}
