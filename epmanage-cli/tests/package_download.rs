//! Integration tests for package listing and download.

use std::sync::Arc;

use epmanage_cli::api::package::{PackageClient, PackageError};
use epmanage_cli::error::ClientError;
use epmanage_cli::session::Session;
use epmanage_shared::package::Package;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn package_list(server: &MockServer) -> Value {
    json!({"data": [
        {
            "os": "linux",
            "date": "2016-11-02T10:00:00+00:00",
            "packages": [
                {"arch": "x64", "name": "epc-x64.deb", "url": format!("{}/dl/u1", server.uri())},
                {"arch": "arm", "name": "epc-arm.deb", "url": "/dl/u2"}
            ]
        },
        {
            "os": "windows",
            "packages": [
                {"osversion": "10", "arch": "x64", "name": "epc.msi", "url": "/dl/broken"}
            ]
        }
    ]})
}

async fn create_client(server: &MockServer) -> PackageClient {
    Mock::given(method("GET"))
        .and(path("/frontend/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(package_list(server)))
        .mount(server)
        .await;
    let session = Session::new().expect("failed to create session");
    session.set_base_url(server.uri());
    session.set_token("test-token");
    PackageClient::new(Arc::new(session))
}

#[tokio::test]
async fn test_list_groups() {
    let server = MockServer::start().await;
    let client = create_client(&server).await;

    let groups = client.list().await.expect("list failed");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].os, "linux");
    assert!(groups[0].generated_at().is_some());
    assert_eq!(groups[1].packages[0].osversion.as_deref(), Some("10"));
}

#[tokio::test]
async fn test_download_by_arch_without_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/u1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"deb-bytes".to_vec())
                .insert_header("content-disposition", "attachment; filename=epc-x64.deb"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = create_client(&server).await;

    let mut calls = 0;
    let mut choose = |_: &[&Package]| {
        calls += 1;
        0
    };
    let package = client
        .download("linux", None, Some("x64"), Some(&mut choose))
        .await
        .expect("download failed");
    assert_eq!(calls, 0);
    assert_eq!(package.filename, "epc-x64.deb");
    assert_eq!(package.content, b"deb-bytes");
}

#[tokio::test]
async fn test_download_uses_callback_choice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/u2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"arm".to_vec())
                .insert_header("content-disposition", "attachment; filename=\"epc-arm.deb\""),
        )
        .mount(&server)
        .await;
    let client = create_client(&server).await;

    let mut offered = Vec::new();
    let mut choose = |candidates: &[&Package]| {
        offered = candidates.iter().map(|p| p.name.clone()).collect();
        1
    };
    let package = client
        .download("linux", None, None, Some(&mut choose))
        .await
        .expect("download failed");
    assert_eq!(offered, vec!["epc-x64.deb", "epc-arm.deb"]);
    assert_eq!(package.filename, "epc-arm.deb");
}

#[tokio::test]
async fn test_download_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;
    let client = create_client(&server).await;

    let err = client.download("solaris", None, None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown os \"solaris\"");

    let err = client.download("linux", None, None, None).await.unwrap_err();
    assert!(matches!(err, PackageError::Ambiguous(2)));

    let err = client.download("linux", None, Some("mips"), None).await.unwrap_err();
    assert_eq!(err.to_string(), "No package found");

    let err = client.download("windows", None, None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid response from server (no filename)");
}

#[tokio::test]
async fn test_download_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/u1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = create_client(&server).await;

    let err = client.download("linux", None, Some("x64"), None).await.unwrap_err();
    assert!(matches!(err, PackageError::Download(ClientError::Api { .. })));
    assert!(err.to_string().starts_with("Cannot download package"));
}
