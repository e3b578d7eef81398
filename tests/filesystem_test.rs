//! Path namespace behavior against a mock service.

mod common;

use common::*;
use futures::TryStreamExt;
use quqifs::{QuqiError, ResourceKind};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `/docs/sub/a.txt` under the root, one listing per level.
async fn mount_tree(server: &MockServer, times: u64) {
    mount_listing(
        server,
        ROOT_ID,
        json!({ "dir": [dir_item(100, ROOT_ID, "docs")], "file": [] }),
        times,
    )
    .await;
    mount_listing(
        server,
        100,
        json!({ "dir": [dir_item(101, 100, "sub")], "file": [] }),
        times,
    )
    .await;
    mount_listing(
        server,
        101,
        json!({ "dir": [], "file": [file_item(102, 101, "a", "txt", 5)] }),
        times,
    )
    .await;
}

#[tokio::test]
async fn stat_reloads_each_uncached_level_once() {
    let server = MockServer::start().await;
    mount_tree(&server, 1).await;
    let fs = connected_fs(&server).await;

    let entry = fs.stat("/docs/sub/a.txt").await.unwrap();
    assert_eq!(entry.node_id, 102);
    assert_eq!(entry.kind, ResourceKind::File);
    assert_eq!(entry.size, 5);

    let listed: Vec<String> = requests_to(&server, LIST)
        .await
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect();
    assert_eq!(listed.len(), 3);
    assert!(listed[0].contains(&format!("node_id={}", ROOT_ID)));
    assert!(listed[1].contains("node_id=100"));
    assert!(listed[2].contains("node_id=101"));

    // Now fully cached: no further listing.
    assert_eq!(fs.size("/docs/sub/a.txt").await.unwrap(), 5);
    assert_eq!(fs.resource_type("/docs/sub").await.unwrap(), ResourceKind::Directory);
    assert_eq!(requests_to(&server, LIST).await.len(), 3);
}

#[tokio::test]
async fn stat_of_missing_path_is_not_found() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [dir_item(100, ROOT_ID, "docs")], "file": [] }),
        1,
    )
    .await;
    let fs = connected_fs(&server).await;

    // `/ghost` does not exist, so nothing below it is listed.
    assert!(matches!(
        fs.stat("/ghost/file.txt").await,
        Err(QuqiError::NotFound(_))
    ));
    assert!(fs.cached("/ghost").await.is_none());
    assert_eq!(requests_to(&server, LIST).await.len(), 1);
}

#[tokio::test]
async fn listing_composes_display_names() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({
            "dir": [dir_item(100, ROOT_ID, "docs")],
            "file": [
                file_item(110, ROOT_ID, "report", "pdf", 10),
                {
                    "nid": 111, "parent_id": ROOT_ID, "name": "README",
                    "add_time": 1, "size": 3, "filetype": "q-default", "ext": "md"
                },
                file_item(112, ROOT_ID, "Makefile", "", 7)
            ]
        }),
        1,
    )
    .await;
    let fs = connected_fs(&server).await;

    let listed = fs.list_directory("/").await.unwrap();
    assert_eq!(listed, vec!["/docs", "/report.pdf", "/README", "/Makefile"]);
    assert_eq!(fs.cached("/report.pdf").await.map(|e| e.node_id), Some(110));
}

#[tokio::test]
async fn listing_prunes_vanished_children() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LIST))
        .respond_with(ok(json!({
            "dir": [dir_item(100, ROOT_ID, "old"), dir_item(101, ROOT_ID, "kept")],
            "file": []
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LIST))
        .respond_with(ok(json!({ "dir": [dir_item(101, ROOT_ID, "kept")], "file": [] })))
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    assert!(fs.cached("/old").await.is_some());
    fs.list_directory("/").await.unwrap();
    assert!(fs.cached("/old").await.is_none());
    assert!(fs.cached("/kept").await.is_some());
}

#[tokio::test]
async fn mkdir_then_type_is_a_cache_hit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dir/mkdir"))
        .and(body_string_contains(format!("parent_id={}", ROOT_ID)))
        .and(body_string_contains("name=photos"))
        .respond_with(ok(json!({ "node_id": 300 })))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.create("/photos", ResourceKind::Directory).await.unwrap();
    assert_eq!(fs.resource_type("/photos").await.unwrap(), ResourceKind::Directory);
    assert_eq!(fs.stat("/photos").await.unwrap().parent_id, ROOT_ID);
    assert!(requests_to(&server, LIST).await.is_empty());
}

#[tokio::test]
async fn create_file_is_deferred() {
    let server = MockServer::start().await;
    let fs = connected_fs(&server).await;

    fs.create("/empty.txt", ResourceKind::File).await.unwrap();
    assert!(fs.cached("/empty.txt").await.is_none());
    assert_eq!(requests_to(&server, "/api/dir/mkdir").await.len(), 0);
}

#[tokio::test]
async fn create_under_missing_parent_is_not_found() {
    let server = MockServer::start().await;
    mount_listing(&server, ROOT_ID, json!({ "dir": [], "file": [] }), 1).await;
    let fs = connected_fs(&server).await;

    assert!(matches!(
        fs.create("/nope/child", ResourceKind::Directory).await,
        Err(QuqiError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_then_stat_is_not_found() {
    let server = MockServer::start().await;
    // The first listing shows the file; after deletion the server no longer does.
    Mock::given(method("POST"))
        .and(path(LIST))
        .respond_with(ok(json!({
            "dir": [],
            "file": [file_item(120, ROOT_ID, "a", "txt", 1)]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LIST))
        .respond_with(ok(json!({ "dir": [], "file": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/node/del"))
        .and(body_string_contains("node_id=120"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    fs.delete("/a.txt").await.unwrap();
    assert!(fs.cached("/a.txt").await.is_none());
    assert!(matches!(fs.stat("/a.txt").await, Err(QuqiError::NotFound(_))));
}

#[tokio::test]
async fn failed_delete_keeps_entry() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [], "file": [file_item(120, ROOT_ID, "a", "txt", 1)] }),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/node/del"))
        .respond_with(failure(7, "locked"))
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    assert!(matches!(
        fs.delete("/a.txt").await,
        Err(QuqiError::ApiError { code: 7, .. })
    ));
    assert_eq!(fs.cached("/a.txt").await.map(|e| e.node_id), Some(120));
}

#[tokio::test]
async fn rename_rekeys_cached_subtree() {
    let server = MockServer::start().await;
    mount_tree(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/node/rename"))
        .and(body_string_contains("node_id=100"))
        .and(body_string_contains("rename=papers"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.stat("/docs/sub/a.txt").await.unwrap();
    fs.move_resource("/docs", "/papers").await.unwrap();

    assert!(fs.cached("/docs").await.is_none());
    assert_eq!(fs.cached("/papers/sub/a.txt").await.map(|e| e.node_id), Some(102));
}

#[tokio::test]
async fn cross_directory_move_is_unsupported() {
    let server = MockServer::start().await;
    let fs = connected_fs(&server).await;

    assert!(matches!(
        fs.move_resource("/a/x.txt", "/b/x.txt").await,
        Err(QuqiError::Unsupported(_))
    ));
    assert!(requests_to(&server, "/api/node/rename").await.is_empty());
}

#[tokio::test]
async fn refresh_reads_remote_stat() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [], "file": [file_item(120, ROOT_ID, "a", "txt", 1)] }),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/node/stat"))
        .and(body_string_contains("node_id=120"))
        .respond_with(ok(json!({
            "node_id": 120, "parent_id": ROOT_ID, "name": "a", "add_time": 1_700_000_000, "size": 64
        })))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    let entry = fs.refresh("/a.txt").await.unwrap();
    assert_eq!(entry.size, 64);
    assert_eq!(fs.creation_date("/a.txt").await.unwrap(), 1_700_000_000);
    assert_eq!(fs.last_modified_date("/a.txt").await.unwrap(), 1_700_000_000);
}

#[tokio::test]
async fn open_read_streams_file_body() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [], "file": [file_item(120, ROOT_ID, "a", "txt", 11)] }),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/doc/download"))
        .and(query_param("node_id", "120"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"hello world".to_vec(), "application/force-download"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    let chunks: Vec<_> = fs.open_read("/a.txt").await.unwrap().try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"hello world");
}

#[tokio::test]
async fn download_error_envelope_is_detected() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [], "file": [file_item(120, ROOT_ID, "a", "txt", 11)] }),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/doc/download"))
        .respond_with(failure(20, "file is being processed"))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    match fs.open_read("/a.txt").await {
        Err(QuqiError::ApiError { code, message }) => {
            assert_eq!(code, 20);
            assert_eq!(message, "file is being processed");
        }
        Err(other) => panic!("expected ApiError, got {:?}", other),
        Ok(_) => panic!("expected ApiError, got a stream"),
    }
}

#[tokio::test]
async fn lock_and_property_storage() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [dir_item(100, ROOT_ID, "docs")], "file": [] }),
        2,
    )
    .await;
    let fs = connected_fs(&server).await;
    fs.list_directory("/").await.unwrap();

    fs.set_property("/docs", "displayname", "Docs").await.unwrap();
    fs.list_directory("/").await.unwrap();
    assert_eq!(
        fs.properties("/docs").await.get("displayname").map(String::as_str),
        Some("Docs")
    );

    assert!(fs.properties("/unknown").await.is_empty());
    assert!(matches!(
        fs.set_property("/unknown", "a", "b").await,
        Err(QuqiError::NotFound(_))
    ));
}

#[tokio::test]
async fn listed_children_take_the_listed_directory_as_parent() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({
            "dir": [{ "nid": 100, "name": "docs", "add_time": 1 }],
            "file": [file_item(120, 999, "a", "txt", 1)]
        }),
        1,
    )
    .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    assert_eq!(fs.cached("/docs").await.map(|e| e.parent_id), Some(ROOT_ID));
    assert_eq!(fs.cached("/a.txt").await.map(|e| e.parent_id), Some(ROOT_ID));
}

#[tokio::test]
async fn refresh_without_parent_keeps_parent_link() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({ "dir": [dir_item(100, ROOT_ID, "docs")], "file": [] }),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/node/stat"))
        .and(body_string_contains("node_id=100"))
        .respond_with(ok(json!({ "nid": 100, "name": "docs", "add_time": 5 })))
        .expect(1)
        .mount(&server)
        .await;
    let fs = connected_fs(&server).await;

    fs.list_directory("/").await.unwrap();
    let entry = fs.refresh("/docs").await.unwrap();
    assert_eq!(entry.parent_id, ROOT_ID);
    assert_eq!(entry.created_at, 5);
    assert_eq!(fs.cached("/docs").await.map(|e| e.parent_id), Some(ROOT_ID));
}

#[tokio::test]
async fn name_collision_keeps_the_directory() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ROOT_ID,
        json!({
            "dir": [dir_item(100, ROOT_ID, "a")],
            "file": [{
                "nid": 120, "parent_id": ROOT_ID, "name": "a", "add_time": 1,
                "size": 3, "filetype": "q-default", "ext": "bin"
            }]
        }),
        1,
    )
    .await;
    let fs = connected_fs(&server).await;

    assert_eq!(fs.list_directory("/").await.unwrap(), vec!["/a".to_string()]);
    assert_eq!(fs.resource_type("/a").await.unwrap(), ResourceKind::Directory);
    assert_eq!(fs.cached("/a").await.map(|e| e.node_id), Some(100));
}

#[tokio::test]
async fn moving_missing_path_onto_itself_is_not_found() {
    let server = MockServer::start().await;
    mount_listing(&server, ROOT_ID, json!({ "dir": [], "file": [] }), 1).await;
    let fs = connected_fs(&server).await;

    assert!(matches!(
        fs.move_resource("/ghost", "/ghost").await,
        Err(QuqiError::NotFound(_))
    ));
    assert!(requests_to(&server, "/api/node/rename").await.is_empty());
}
