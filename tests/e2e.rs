//! End-to-end pipeline tests against a stub predict command.
//!
//! The stub scripts stand in for the external inference tool: they parse
//! the same argv the real tool receives, then either copy the input to the
//! expected prediction path, exit non-zero, or write nothing. A local
//! hyper server plays the role of the URL input source.

#![cfg(unix)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};

use flood_detection::inference::{pipeline, DeploymentConfig, PipelineError};
use flood_detection::web::routes::predict::handle_predict;

/// Stub that behaves like a successful predict run: copies the input file
/// to `<output_dir>/<stem>_pred.tif` and exits 0.
const STUB_SUCCESS: &str = r#"
in=""; out=""; grep=""; prev=""
for a in "$@"; do
  case "$prev" in
    --predict_output_dir) out="$a" ;;
    --data.init_args.predict_data_root) in="$a" ;;
    --data.init_args.img_grep) grep="$a" ;;
  esac
  prev="$a"
done
stem="${grep%.*}"
cp "$in/$grep" "$out/${stem}_pred.tif"
echo "prediction complete"
exit 0
"#;

/// Stub that fails like a crashing inference run.
const STUB_FAIL: &str = r#"
echo "model blew up" >&2
exit 7
"#;

/// Stub that exits 0 without producing any output file.
const STUB_SILENT: &str = "exit 0\n";

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn test_config(dir: &Path, predict_bin: &str) -> DeploymentConfig {
    DeploymentConfig {
        predict_bin: predict_bin.to_string(),
        workspace_root: dir.join("workspaces"),
        project_code_dir: dir.to_path_buf(),
        download_timeout_secs: 5,
        ..DeploymentConfig::default()
    }
}

/// Serve `payload` at `/input.tif`; everything else is a 404.
async fn spawn_file_server(payload: Vec<u8>) -> SocketAddr {
    let make_svc = make_service_fn(move |_conn| {
        let payload = payload.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let payload = payload.clone();
                async move {
                    if req.uri().path() == "/input.tif" {
                        Ok::<_, Infallible>(Response::new(Body::from(payload)))
                    } else {
                        Ok(Response::builder()
                            .status(StatusCode::NOT_FOUND)
                            .body(Body::empty())
                            .unwrap())
                    }
                }
            }))
        }
    });
    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn assert_no_workspaces(config: &DeploymentConfig) {
    let count = std::fs::read_dir(&config.workspace_root)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(count, 0, "workspace directory left behind");
}

async fn wait_for_cleanup(config: &DeploymentConfig) {
    for _ in 0..50 {
        let count = std::fs::read_dir(&config.workspace_root)
            .map(|entries| entries.count())
            .unwrap_or(0);
        if count == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!(
        "workspace directory not cleaned up under {}",
        config.workspace_root.display()
    );
}

fn run_url_pipeline(
    config: &DeploymentConfig,
    url: &str,
) -> impl std::future::Future<Output = Result<Vec<u8>, PipelineError>> {
    let config = config.clone();
    let url = url.to_string();
    async move {
        tokio::task::spawn_blocking(move || {
            pipeline::generate_flood_map(&config, &url, "flood_001.tif")
        })
        .await
        .unwrap()
    }
}

#[tokio::test]
async fn test_url_pipeline_returns_prediction_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_SUCCESS);
    let config = test_config(dir.path(), stub.to_str().unwrap());
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let payload = b"II*\x00flood-raster-bytes".to_vec();
    let addr = spawn_file_server(payload.clone()).await;
    let url = format!("http://{addr}/input.tif");

    let bytes = run_url_pipeline(&config, &url).await.unwrap();
    assert_eq!(bytes, payload);
    assert_no_workspaces(&config);
}

#[tokio::test]
async fn test_url_pipeline_download_failure_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_SUCCESS);
    let config = test_config(dir.path(), stub.to_str().unwrap());
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let addr = spawn_file_server(b"unused".to_vec()).await;
    let url = format!("http://{addr}/missing.tif");

    let err = run_url_pipeline(&config, &url).await.unwrap_err();
    assert!(matches!(err, PipelineError::Download(_)));
    assert_no_workspaces(&config);
}

#[tokio::test]
async fn test_url_pipeline_inference_failure_carries_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_FAIL);
    let config = test_config(dir.path(), stub.to_str().unwrap());
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let addr = spawn_file_server(b"raster".to_vec()).await;
    let url = format!("http://{addr}/input.tif");

    let err = run_url_pipeline(&config, &url).await.unwrap_err();
    match err {
        PipelineError::InferenceFailed { exit_code } => assert_eq!(exit_code, 7),
        other => panic!("expected InferenceFailed, got {other:?}"),
    }
    assert_no_workspaces(&config);
}

#[tokio::test]
async fn test_url_pipeline_missing_output_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_SILENT);
    let config = test_config(dir.path(), stub.to_str().unwrap());
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let addr = spawn_file_server(b"raster".to_vec()).await;
    let url = format!("http://{addr}/input.tif");

    let err = run_url_pipeline(&config, &url).await.unwrap_err();
    assert!(matches!(err, PipelineError::OutputNotFound(_)));
    assert_no_workspaces(&config);
}

#[tokio::test]
async fn test_url_pipeline_missing_binary_is_tool_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "definitely-missing-predict-tool");
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let addr = spawn_file_server(b"raster".to_vec()).await;
    let url = format!("http://{addr}/input.tif");

    let err = run_url_pipeline(&config, &url).await.unwrap_err();
    assert!(matches!(err, PipelineError::ToolNotFound(_)));
    assert_no_workspaces(&config);
}

// --- HTTP front end ---

fn multipart_request(filename: &str, payload: &[u8]) -> Request<Body> {
    let boundary = "----floode2eboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/tiff\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/predict/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_endpoint_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_SUCCESS);
    let config = Arc::new(test_config(dir.path(), stub.to_str().unwrap()));
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let payload = b"II*\x00uploaded-raster".to_vec();
    let response = handle_predict(multipart_request("flood_001.tif", &payload), config.clone())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/tiff"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("flood_001_pred.tif"));

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(bytes.as_ref(), payload.as_slice());

    // teardown runs on the blocking pool after the response is built
    wait_for_cleanup(&config).await;
}

#[tokio::test]
async fn test_upload_endpoint_rejects_bad_extension_without_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_SUCCESS);
    let config = Arc::new(test_config(dir.path(), stub.to_str().unwrap()));
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let response = handle_predict(multipart_request("flood.png", b"not a tiff"), config.clone())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_no_workspaces(&config);
}

#[tokio::test]
async fn test_upload_endpoint_surfaces_inference_failure() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "terratorch-stub", STUB_FAIL);
    let config = Arc::new(test_config(dir.path(), stub.to_str().unwrap()));
    std::fs::create_dir_all(&config.workspace_root).unwrap();

    let response = handle_predict(multipart_request("flood_001.tif", b"raster"), config.clone())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let detail = String::from_utf8_lossy(&bytes).to_string();
    assert!(detail.contains("exit code 7"), "unexpected detail: {detail}");
    assert_no_workspaces(&config);
}
