//! Shared fixtures for the mock-server tests.
#![allow(dead_code)]

use quqifs::{Account, ClientConfig, QuqiFileSystem};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CLOUD_ID: u64 = 115540;
pub const ROOT_ID: u64 = 43;
pub const LOGIN: &str = "/auth/person/login/password";
pub const LIST: &str = "/api/dir/ls";

pub fn cookie(session_key: &str) -> String {
    format!("quqiid={}; passport_id=p1; session_key={}", CLOUD_ID, session_key)
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_base_url(server.uri())
}

pub fn account() -> Account {
    Account::new("13800000000", "secret", CLOUD_ID, ROOT_ID)
}

/// Envelope carrying `data` with a success code.
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "err": 0, "msg": "", "data": data }))
}

pub fn failure(code: i64, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "err": code, "msg": msg }))
}

pub fn login_reply(session_key: &str) -> ResponseTemplate {
    ok(json!({ "session_key": session_key, "passport_id": "p1" }))
}

/// Login always succeeds with session key `sk1`.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_reply("sk1"))
        .mount(server)
        .await;
}

/// Listing reply for `node_id`, expected to be requested `times` times.
pub async fn mount_listing(server: &MockServer, node_id: u64, data: Value, times: u64) {
    Mock::given(method("POST"))
        .and(path(LIST))
        .and(body_string_contains(format!("node_id={}", node_id)))
        .respond_with(ok(data))
        .expect(times)
        .mount(server)
        .await;
}

pub fn dir_item(nid: u64, parent_id: u64, name: &str) -> Value {
    json!({ "nid": nid, "parent_id": parent_id, "name": name, "add_time": 1_600_000_000 })
}

pub fn file_item(nid: u64, parent_id: u64, name: &str, ext: &str, size: u64) -> Value {
    json!({
        "nid": nid,
        "parent_id": parent_id,
        "name": name,
        "add_time": 1_600_000_000,
        "size": size,
        "filetype": "text",
        "ext": ext
    })
}

pub async fn connected_fs(server: &MockServer) -> QuqiFileSystem {
    mount_login(server).await;
    let fs = QuqiFileSystem::new(config(server), account()).unwrap();
    fs.connect().await.unwrap();
    fs
}

/// Requests the server received for `endpoint`.
pub async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .collect()
}
