//! End-to-end tests for the registry HTTP API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::BTreeMap,
    io::{Cursor, Read, Write},
    net::SocketAddr,
    path::Path,
};

use {
    reqwest::multipart::{Form, Part},
    serde_json::{Value, json},
    tokio::net::TcpListener,
    zip::{ZipArchive, ZipWriter, write::SimpleFileOptions},
};

use {
    skillrack_config::{RegistryConfig, StorageConfig},
    skillrack_gateway::server::{AppState, build_registry_app},
};

struct TestServer {
    addr: SocketAddr,
    root: tempfile::TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn skills(&self) -> std::path::PathBuf {
        self.root.path().join("skills")
    }

    fn versions_file(&self) -> std::path::PathBuf {
        self.root.path().join("config").join("versions.json")
    }

    fn read_index(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.versions_file()).unwrap()).unwrap()
    }
}

/// Start a server over a temp storage root seeded by `seed`.
async fn start_server(seed: impl FnOnce(&Path)) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    seed(root.path());

    let config = RegistryConfig {
        storage: StorageConfig::rooted_at(root.path()),
        ..RegistryConfig::default()
    };
    let state = AppState::from_storage(&config.storage);
    let app = build_registry_app(state, &config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, root }
}

fn write_version(root: &Path, skill: &str, tag: &str, version: &str, locales: &[&str]) {
    let dir = root.join("skills").join(skill).join(tag);
    std::fs::create_dir_all(dir.join("locales")).unwrap();
    std::fs::write(
        dir.join("manifest.json"),
        json!({ "version": version, "dependencies": { "core": ">=1" } }).to_string(),
    )
    .unwrap();
    for locale in locales {
        std::fs::write(
            dir.join("locales").join(format!("{locale}.json")),
            format!("{{\"greeting\":\"{locale}\"}}"),
        )
        .unwrap();
    }
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("assets").join("icon.bin"), [1u8, 2, 3, 254, 255]).unwrap();
}

fn write_index(root: &Path, index: Value) {
    let path = root.join("config").join("versions.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, index.to_string()).unwrap();
}

/// Standard fixture: `weather` with v1 (en) and v2 (en, de), latest v2;
/// `clock` with v1 (de) only, latest "v9" which is not on disk; a hidden
/// `_dummy` skill.
fn seed_catalog(root: &Path) {
    write_version(root, "weather", "v1", "1.0", &["en"]);
    write_version(root, "weather", "v2", "2.0", &["en", "de"]);
    write_version(root, "clock", "v1", "1.0", &["de"]);
    write_version(root, "_dummy", "v1", "0.1", &["en"]);
    write_index(root, json!({ "weather": ["v2", "v1"], "clock": ["v9"] }));
}

fn create_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        writer
            .start_file(*path, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Regular files of a zip, keyed by entry name.
fn zip_files(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        files.insert(entry.name().to_string(), content);
    }
    files
}

fn upload_form(skill: Option<&str>, tag: Option<&str>, archive: Option<Vec<u8>>) -> Form {
    let mut form = Form::new();
    if let Some(skill) = skill {
        form = form.text("skillName", skill.to_string());
    }
    if let Some(tag) = tag {
        form = form.text("versionTag", tag.to_string());
    }
    if let Some(bytes) = archive {
        form = form.part("zipped", Part::bytes(bytes).file_name("skill.zip"));
    }
    form
}

async fn get_json(server: &TestServer, path: &str) -> Value {
    let resp = reqwest::get(server.url(path)).await.unwrap();
    assert_eq!(resp.status(), 200, "GET {path}");
    resp.json().await.unwrap()
}

// ── GET /skills/{locale} ────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_versions_by_locale_but_keeps_latest() {
    let server = start_server(seed_catalog).await;

    let body = get_json(&server, "/skills/en").await;
    assert_eq!(
        body,
        json!({
            "clock": { "name": "clock", "versions": [], "latest": "v9" },
            "weather": { "name": "weather", "versions": ["v1", "v2"], "latest": "v2" },
        })
    );

    let body = get_json(&server, "/skills/de").await;
    assert_eq!(body["clock"]["versions"], json!(["v1"]));
    assert_eq!(body["weather"]["versions"], json!(["v2"]));
}

#[tokio::test]
async fn list_omits_latest_for_unindexed_skill() {
    let server = start_server(|root| {
        write_version(root, "fresh", "v1", "1.0", &["en"]);
    })
    .await;

    let body = get_json(&server, "/skills/en").await;
    assert_eq!(body, json!({ "fresh": { "name": "fresh", "versions": ["v1"] } }));
    // First access created the index file.
    assert_eq!(server.read_index(), json!({}));
}

// ── GET /skill/{skill}/{tag} ────────────────────────────────────────────────

#[tokio::test]
async fn detail_returns_manifest_and_locales() {
    let server = start_server(seed_catalog).await;

    let body = get_json(&server, "/skill/weather/v2").await;
    assert_eq!(
        body,
        json!({
            "version": "2.0",
            "locales": ["de", "en"],
            "dependencies": { "core": ">=1" },
        })
    );
}

#[tokio::test]
async fn detail_not_found_is_a_payload_error() {
    let server = start_server(seed_catalog).await;
    let not_found = json!({ "error": "Skill/Version not found!" });

    assert_eq!(get_json(&server, "/skill/weather/v7").await, not_found);
    assert_eq!(get_json(&server, "/skill/nope/v1").await, not_found);
    // Hidden skills exist on disk but are never served.
    assert_eq!(get_json(&server, "/skill/_dummy/v1").await, not_found);
}

#[tokio::test]
async fn detail_with_broken_manifest_is_a_server_error() {
    let server = start_server(|root| {
        let dir = root.join("skills/broken/v1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("manifest.json"), "{ nope").unwrap();
    })
    .await;

    let resp = reqwest::get(server.url("/skill/broken/v1")).await.unwrap();
    assert_eq!(resp.status(), 500);
}

// ── GET /update/{locale}/{skill}/{version} ──────────────────────────────────

#[tokio::test]
async fn update_check_follows_locale_and_version_string() {
    let server = start_server(seed_catalog).await;

    assert_eq!(
        get_json(&server, "/update/en/weather/1.0").await,
        json!({ "update": true, "version": "2.0" })
    );
    assert_eq!(
        get_json(&server, "/update/fr/weather/1.0").await,
        json!({ "update": false, "version": "1.0" })
    );
    assert_eq!(
        get_json(&server, "/update/en/weather/2.0").await,
        json!({ "update": false, "version": "2.0" })
    );
    // Plain string comparison: a "newer" client is still offered 2.0.
    assert_eq!(
        get_json(&server, "/update/en/weather/3.0").await,
        json!({ "update": true, "version": "2.0" })
    );
}

#[tokio::test]
async fn update_check_with_latest_missing_on_disk_is_a_server_error() {
    let server = start_server(seed_catalog).await;

    let resp = reqwest::get(server.url("/update/de/clock/1.0")).await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn non_string_manifest_version_is_echoed() {
    let server = start_server(|root| {
        write_version(root, "clock", "v1", "unused", &["de"]);
        std::fs::write(
            root.join("skills/clock/v1/manifest.json"),
            r#"{"version":2,"dependencies":[]}"#,
        )
        .unwrap();
        write_index(root, json!({ "clock": ["v1"] }));
    })
    .await;

    assert_eq!(
        get_json(&server, "/skill/clock/v1").await,
        json!({ "version": 2, "locales": ["de"], "dependencies": [] })
    );
    assert_eq!(
        get_json(&server, "/update/de/clock/2").await,
        json!({ "update": true, "version": 2 })
    );
}

#[tokio::test]
async fn update_check_for_unknown_skill() {
    let server = start_server(seed_catalog).await;

    assert_eq!(
        get_json(&server, "/update/en/nope/1.0").await,
        json!({ "update": false, "version": "Skill not existing" })
    );
}

// ── GET /download/{skill}/{tag} ─────────────────────────────────────────────

#[tokio::test]
async fn download_latest_matches_explicit_tag() {
    let server = start_server(seed_catalog).await;

    let latest_tag = get_json(&server, "/skills/en").await["weather"]["latest"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = reqwest::get(server.url("/download/weather/latest"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "application/zip");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"weather.zip\""
    );
    let via_latest = zip_files(&resp.bytes().await.unwrap());

    let explicit = reqwest::get(server.url(&format!("/download/weather/{latest_tag}")))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(via_latest, zip_files(&explicit));
    assert!(via_latest.contains_key("v2/manifest.json"));
}

#[tokio::test]
async fn download_round_trip_reproduces_files() {
    let server = start_server(seed_catalog).await;

    let bytes = reqwest::get(server.url("/download/weather/v1"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    skillrack_registry::archive::extract(&bytes, out.path()).unwrap();

    let original = server.skills().join("weather/v1");
    let unpacked = out.path().join("v1");
    let files = skillrack_registry::archive::list_files(&original).unwrap();
    assert_eq!(
        skillrack_registry::archive::list_files(&unpacked).unwrap(),
        files
    );
    for file in files {
        assert_eq!(
            std::fs::read(original.join(&file)).unwrap(),
            std::fs::read(unpacked.join(&file)).unwrap(),
            "{}",
            file.display()
        );
    }
}

#[tokio::test]
async fn download_unknown_skill_is_plain_text() {
    let server = start_server(seed_catalog).await;

    let resp = reqwest::get(server.url("/download/nope/latest"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Error: Skill not existing");
}

#[tokio::test]
async fn download_tag_without_directory_is_plain_text() {
    let server = start_server(seed_catalog).await;

    for path in ["/download/weather/v7", "/download/clock/latest"] {
        let resp = reqwest::get(server.url(path)).await.unwrap();
        assert_eq!(resp.status(), 200, "GET {path}");
        assert_eq!(resp.text().await.unwrap(), "Error: Skill not existing");
    }
}

#[tokio::test]
async fn download_path_like_tag_is_plain_text() {
    let server = start_server(seed_catalog).await;

    let resp = reqwest::get(server.url("/download/weather/..%2F..%2Fconfig"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(resp.text().await.unwrap(), "Error: Skill not existing");
}

// ── POST /upload ────────────────────────────────────────────────────────────

async fn post_upload(server: &TestServer, form: Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_requires_fields_in_order() {
    let server = start_server(|_| {}).await;
    let archive = create_zip(&[("manifest.json", br#"{"version":"1"}"#)]);

    let cases = [
        (upload_form(None, Some("v1"), Some(archive.clone())), "Enter SkillName"),
        (upload_form(Some(""), None, None), "Enter SkillName"),
        (upload_form(Some("clock"), None, Some(archive)), "Enter Version Tag"),
        (upload_form(Some("clock"), Some("v1"), None), "No file uploaded"),
    ];
    for (form, message) in cases {
        let resp = post_upload(&server, form).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.json::<Value>().await.unwrap(),
            json!({ "status": false, "message": message })
        );
    }
    assert!(!server.skills().exists());
}

#[tokio::test]
async fn urlencoded_upload_reads_fields_but_has_no_file() {
    let server = start_server(|_| {}).await;

    let resp = reqwest::Client::new()
        .post(server.url("/upload"))
        .form(&[("skillName", "clock"), ("versionTag", "v1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "status": false, "message": "No file uploaded" })
    );
    assert!(!server.skills().exists());
}

#[tokio::test]
async fn json_upload_reads_fields_in_order() {
    let server = start_server(|_| {}).await;

    let resp = reqwest::Client::new()
        .post(server.url("/upload"))
        .json(&json!({ "skillName": "clock" }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "status": false, "message": "Enter Version Tag" })
    );
}

#[tokio::test]
async fn untyped_upload_body_carries_no_fields() {
    let server = start_server(|_| {}).await;

    let resp = reqwest::Client::new()
        .post(server.url("/upload"))
        .body("skillName=clock")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "status": false, "message": "Enter SkillName" })
    );
}

#[tokio::test]
async fn upload_extracts_and_becomes_latest() {
    let server = start_server(seed_catalog).await;
    let archive = create_zip(&[
        ("manifest.json", br#"{"version":"3.0","dependencies":[]}"#),
        ("locales/en.json", b"{}"),
        ("locales/fr.json", b"{}"),
    ]);

    let resp = post_upload(&server, upload_form(Some("weather"), Some("v3"), Some(archive))).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "status": true, "message": "Skill Uploaded" })
    );

    assert_eq!(server.read_index()["weather"], json!(["v3", "v2", "v1"]));
    assert_eq!(
        get_json(&server, "/update/fr/weather/2.0").await,
        json!({ "update": true, "version": "3.0" })
    );
    assert_eq!(
        get_json(&server, "/skill/weather/v3").await,
        json!({ "version": "3.0", "locales": ["en", "fr"], "dependencies": [] })
    );
}

#[tokio::test]
async fn reupload_overwrites_files_and_duplicates_index_entry() {
    let server = start_server(|_| {}).await;

    for version in ["1.0", "1.1"] {
        let manifest = format!(r#"{{"version":"{version}"}}"#);
        let archive = create_zip(&[("manifest.json", manifest.as_bytes())]);
        let resp =
            post_upload(&server, upload_form(Some("clock"), Some("v1"), Some(archive))).await;
        assert_eq!(resp.status(), 200);
    }

    assert_eq!(server.read_index(), json!({ "clock": ["v1", "v1"] }));
    let versions: Vec<_> = std::fs::read_dir(server.skills().join("clock"))
        .unwrap()
        .collect();
    assert_eq!(versions.len(), 1);
    assert_eq!(get_json(&server, "/skill/clock/v1").await["version"], "1.1");
}

#[tokio::test]
async fn corrupt_archive_is_a_server_error() {
    let server = start_server(|root| write_index(root, json!({}))).await;

    let resp = post_upload(
        &server,
        upload_form(Some("clock"), Some("v1"), Some(b"not a zip".to_vec())),
    )
    .await;
    assert_eq!(resp.status(), 500);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());
    assert!(server.read_index().get("clock").is_none());
}

#[tokio::test]
async fn upload_with_traversal_name_is_rejected() {
    let server = start_server(|_| {}).await;
    let archive = create_zip(&[("manifest.json", br#"{"version":"1"}"#)]);

    let resp = post_upload(&server, upload_form(Some(".."), Some("v1"), Some(archive))).await;
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "status": false, "message": "Invalid SkillName" })
    );
}

// ── Misc ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let server = start_server(|_| {}).await;
    assert_eq!(get_json(&server, "/health").await["status"], "ok");
}

#[tokio::test]
async fn public_dir_is_served_as_fallback() {
    let server = start_server(|root| {
        std::fs::create_dir_all(root.join("public")).unwrap();
        std::fs::write(root.join("public/upload.html"), "<form></form>").unwrap();
    })
    .await;

    let resp = reqwest::get(server.url("/upload.html")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "<form></form>");
}
