use super::*;
use crate::archive_name::raw_name;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const SERVER: &str = "https://symbols.example.com/download/symbols";
const USER_AGENT: &str = "pdb-dl-test/1.0";
const VERSION: &str = "1EB9FACB04EA273BB4BA52C3D77EAC0C1";

/// Fetcher that serves a fixed set of archive names and records every request
#[derive(Default)]
struct MockFetcher {
    available: bool,
    served: HashMap<String, Vec<u8>>,
    probes: AtomicUsize,
    requests: Mutex<Vec<(String, String, PathBuf)>>,
}

impl MockFetcher {
    fn available() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    fn unavailable() -> Self {
        Self::default()
    }

    fn serving(mut self, archive_name: &str, body: &[u8]) -> Self {
        self.served.insert(archive_name.to_string(), body.to_vec());
        self
    }

    fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    async fn fetch(&self, url: &str, user_agent: &str, destination: &Path) -> Result<()> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            user_agent.to_string(),
            destination.to_path_buf(),
        ));
        let archive_name = url.rsplit('/').next().unwrap_or_default();
        match self.served.get(archive_name) {
            Some(body) => {
                std::fs::write(destination, body)?;
                Ok(())
            }
            None => Err(Error::FetchFailed {
                url: url.to_string(),
                reason: "simulated network error".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// What [`MockExtractor`] leaves behind after a successful extraction
#[derive(Default)]
enum MockOutput {
    /// The name derived from the archive
    #[default]
    Derived,
    /// A file with a fixed name, as stored in the cabinet
    Named(&'static str),
    /// Nothing at all
    Empty,
}

/// Extractor that writes a PDB next to the archive, or fails on demand
#[derive(Default)]
struct MockExtractor {
    available: bool,
    fails: bool,
    output: MockOutput,
    probes: AtomicUsize,
    extractions: Mutex<Vec<PathBuf>>,
}

impl MockExtractor {
    fn working() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    fn writing(name: &'static str) -> Self {
        Self {
            output: MockOutput::Named(name),
            ..Self::working()
        }
    }

    fn empty() -> Self {
        Self {
            output: MockOutput::Empty,
            ..Self::working()
        }
    }

    fn failing() -> Self {
        Self {
            available: true,
            fails: true,
            ..Default::default()
        }
    }

    fn unavailable() -> Self {
        Self::default()
    }

    fn extraction_count(&self) -> usize {
        self.extractions.lock().unwrap().len()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    async fn extract(&self, archive: &Path, destination_dir: &Path) -> Result<Vec<PathBuf>> {
        self.extractions.lock().unwrap().push(archive.to_path_buf());
        assert!(archive.exists(), "archive must exist while extracting");
        if self.fails {
            return Err(Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: "simulated corrupt cabinet".to_string(),
            });
        }
        let name = match self.output {
            MockOutput::Derived => raw_name(archive.file_name().unwrap().to_str().unwrap())?,
            MockOutput::Named(name) => name.to_string(),
            MockOutput::Empty => return Ok(Vec::new()),
        };
        let path = destination_dir.join(name);
        std::fs::write(&path, b"extracted pdb")?;
        Ok(vec![path])
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn request(dir: &TempDir) -> DownloadRequest {
    DownloadRequest::new("ntdll.pdb", VERSION, SERVER, USER_AGENT).with_target_directory(dir.path())
}

fn downloader(
    fetcher: MockFetcher,
    extractor: MockExtractor,
) -> (PdbDownloader, Arc<MockFetcher>, Arc<MockExtractor>) {
    let fetcher = Arc::new(fetcher);
    let extractor = Arc::new(extractor);
    (
        PdbDownloader::new(fetcher.clone(), extractor.clone()),
        fetcher,
        extractor,
    )
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_compressed_fetch_and_extract_succeeds() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available().serving("ntdll.pd_", b"MSCF"),
        MockExtractor::working(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pdb")));
    assert!(result.local_path.unwrap().exists());
    assert_eq!(extractor.extraction_count(), 1);
    assert_eq!(dir_entries(&dir), vec!["ntdll.pdb"]);
    assert_eq!(
        fetcher.requested_urls(),
        vec![format!("{SERVER}/ntdll.pdb/{VERSION}/ntdll.pd_")]
    );
}

#[tokio::test]
async fn test_extracted_name_case_is_preserved() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, _extractor) = downloader(
        MockFetcher::available().serving("APP.PD_", b"MSCF"),
        MockExtractor::writing("APP.PDB"),
    );
    let request =
        DownloadRequest::new("APP.PDB", VERSION, SERVER, USER_AGENT).with_target_directory(dir.path());

    let result = downloader.run(&request).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("APP.PDB")));
    assert!(result.local_path.unwrap().exists());
    assert_eq!(dir_entries(&dir), vec!["APP.PDB"]);
    assert_eq!(fetcher.requested_urls().len(), 1);
}

#[tokio::test]
async fn test_single_extracted_file_with_other_name() {
    let dir = TempDir::new().unwrap();
    let (downloader, _fetcher, _extractor) = downloader(
        MockFetcher::available().serving("ntdll.pd_", b"MSCF"),
        MockExtractor::writing("wntdll.pdb"),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("wntdll.pdb")));
    assert!(result.local_path.unwrap().exists());
}

#[tokio::test]
async fn test_extraction_without_pdb_falls_back_to_raw() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available()
            .serving("ntdll.pd_", b"MSCF")
            .serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::empty(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pdb")));
    assert_eq!(extractor.extraction_count(), 1);
    assert_eq!(fetcher.requested_urls().len(), 2);
    assert_eq!(dir_entries(&dir), vec!["ntdll.pdb"]);
    assert_eq!(
        std::fs::read(dir.path().join("ntdll.pdb")).unwrap(),
        b"raw pdb"
    );
}

#[test]
fn test_select_deliverable() {
    let exact = PathBuf::from("out/app.pdb");
    let upper = PathBuf::from("out/APP.PDB");
    let other = PathBuf::from("out/readme.txt");

    assert_eq!(
        select_deliverable(&[upper.clone(), exact.clone()], "app.pdb"),
        Some(exact.as_path())
    );
    assert_eq!(
        select_deliverable(&[other.clone(), upper.clone()], "APP.PDb"),
        Some(upper.as_path())
    );
    assert_eq!(
        select_deliverable(std::slice::from_ref(&other), "app.pdb"),
        Some(other.as_path())
    );
    assert_eq!(select_deliverable(&[other.clone(), other.clone()], "app.pdb"), None);
    assert_eq!(select_deliverable(&[], "app.pdb"), None);
}

#[tokio::test]
async fn test_compressed_fetch_failure_falls_back_to_raw() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available().serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::working(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pdb")));
    assert_eq!(extractor.extraction_count(), 0);
    assert_eq!(dir_entries(&dir), vec!["ntdll.pdb"]);
    assert_eq!(
        std::fs::read(dir.path().join("ntdll.pdb")).unwrap(),
        b"raw pdb"
    );
    assert_eq!(
        fetcher.requested_urls(),
        vec![
            format!("{SERVER}/ntdll.pdb/{VERSION}/ntdll.pd_"),
            format!("{SERVER}/ntdll.pdb/{VERSION}/ntdll.pdb"),
        ]
    );
}

#[tokio::test]
async fn test_missing_extract_tool_goes_straight_to_raw() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available()
            .serving("ntdll.pd_", b"MSCF")
            .serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::unavailable(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(
        fetcher.requested_urls(),
        vec![format!("{SERVER}/ntdll.pdb/{VERSION}/ntdll.pdb")],
        "no compressed attempt may be made without an extract tool"
    );
    assert_eq!(extractor.probes.load(Ordering::SeqCst), 1);
    assert_eq!(extractor.extraction_count(), 0);
}

#[tokio::test]
async fn test_missing_fetch_tool_fails_without_attempts() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::unavailable().serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::working(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert_eq!(result, AcquisitionResult::failure());
    assert!(fetcher.requested_urls().is_empty());
    assert_eq!(extractor.probes.load(Ordering::SeqCst), 0);
    assert!(dir_entries(&dir).is_empty());
}

#[tokio::test]
async fn test_empty_debug_file_name_fails_before_probing() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) =
        downloader(MockFetcher::available(), MockExtractor::working());
    let request = DownloadRequest::new("", VERSION, SERVER, USER_AGENT).with_target_directory(dir.path());

    let err = downloader.run(&request).await.unwrap_err();

    assert!(matches!(err, Error::MissingDebugFile));
    assert_eq!(fetcher.probes.load(Ordering::SeqCst), 0);
    assert_eq!(extractor.probes.load(Ordering::SeqCst), 0);
    assert!(fetcher.requested_urls().is_empty());
}

#[tokio::test]
async fn test_extraction_failure_removes_archive_and_falls_back() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available()
            .serving("ntdll.pd_", b"MSCF")
            .serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::failing(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pdb")));
    assert_eq!(extractor.extraction_count(), 1);
    assert!(!dir.path().join("ntdll.pd_").exists());
    assert_eq!(fetcher.requested_urls().len(), 2);
    assert_eq!(dir_entries(&dir), vec!["ntdll.pdb"]);
}

#[tokio::test]
async fn test_extraction_and_raw_failure_leaves_nothing() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, _extractor) = downloader(
        MockFetcher::available().serving("ntdll.pd_", b"MSCF"),
        MockExtractor::failing(),
    );

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert_eq!(result, AcquisitionResult::failure());
    assert_eq!(fetcher.requested_urls().len(), 2);
    assert!(dir_entries(&dir).is_empty());
}

#[tokio::test]
async fn test_everything_fails() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, _extractor) =
        downloader(MockFetcher::available(), MockExtractor::working());

    let result = downloader.run(&request(&dir)).await.unwrap();

    assert!(!result.succeeded);
    assert!(result.local_path.is_none());
    assert_eq!(fetcher.requested_urls().len(), 2);
}

#[tokio::test]
async fn test_extraction_disabled_keeps_archive() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available().serving("ntdll.pd_", b"MSCF"),
        MockExtractor::unavailable(),
    );
    let request = request(&dir).with_extract_policy(ExtractPolicy::Disabled);

    let result = downloader.run(&request).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pd_")));
    assert_eq!(extractor.probes.load(Ordering::SeqCst), 0);
    assert_eq!(extractor.extraction_count(), 0);
    assert_eq!(fetcher.requested_urls().len(), 1);
    assert_eq!(dir_entries(&dir), vec!["ntdll.pd_"]);
}

#[tokio::test]
async fn test_extraction_disabled_falls_back_to_raw() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, extractor) = downloader(
        MockFetcher::available().serving("ntdll.pdb", b"raw pdb"),
        MockExtractor::working(),
    );
    let request = request(&dir).with_extract_policy(ExtractPolicy::Disabled);

    let result = downloader.run(&request).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(dir.path().join("ntdll.pdb")));
    assert_eq!(extractor.extraction_count(), 0);
    assert_eq!(fetcher.requested_urls().len(), 2);
}

#[tokio::test]
async fn test_user_agent_and_destinations() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, _extractor) =
        downloader(MockFetcher::available(), MockExtractor::working());

    let _ = downloader.run(&request(&dir)).await.unwrap();

    let requests = fetcher.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(_, ua, _)| ua == USER_AGENT));
    assert_eq!(requests[0].2, dir.path().join("ntdll.pd_"));
    assert_eq!(requests[1].2, dir.path().join("ntdll.pdb"));
}

#[tokio::test]
async fn test_rerun_overwrites_previous_download() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ntdll.pdb"), b"stale").unwrap();
    let (downloader, _fetcher, _extractor) = downloader(
        MockFetcher::available().serving("ntdll.pdb", b"fresh"),
        MockExtractor::unavailable(),
    );

    let first = downloader.run(&request(&dir)).await.unwrap();
    let second = downloader.run(&request(&dir)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read(dir.path().join("ntdll.pdb")).unwrap(), b"fresh");
}

#[tokio::test]
async fn test_download_for_binary_requires_debug_info() {
    let (downloader, fetcher, _extractor) =
        downloader(MockFetcher::available(), MockExtractor::working());
    let config = Config::default();

    let err = downloader
        .download_for_binary(None, Some(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingDebugFile));

    let empty = DebugInfo::new("", VERSION);
    let err = downloader
        .download_for_binary(Some(&empty), Some(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingDebugFile));
    assert_eq!(fetcher.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_download_for_binary_requires_configuration() {
    let (downloader, fetcher, _extractor) =
        downloader(MockFetcher::available(), MockExtractor::working());
    let info = DebugInfo::new("ntdll.pdb", VERSION);

    let err = downloader
        .download_for_binary(Some(&info), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfiguration { key: None }));

    let config = Config {
        user_agent: String::new(),
        ..Default::default()
    };
    let err = downloader
        .download_for_binary(Some(&info), Some(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfiguration { key: Some(_) }));
    assert_eq!(fetcher.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_download_for_binary_uses_binary_directory() {
    let dir = TempDir::new().unwrap();
    let (downloader, fetcher, _extractor) = downloader(
        MockFetcher::available().serving("app.pdb", b"raw"),
        MockExtractor::unavailable(),
    );
    let mut info = DebugInfo::new("app.pdb", "ABC1");
    info.binary_path = Some(dir.path().join("app.exe"));
    let config = Config {
        symbol_server: "http://localhost:9000/symbols/".into(),
        user_agent: "custom-agent".into(),
        ..Default::default()
    };

    let result = downloader
        .download_for_binary(Some(&info), Some(&config))
        .await
        .unwrap();

    assert_eq!(result.local_path, Some(dir.path().join("app.pdb")));
    let requests = fetcher.requests.lock().unwrap();
    assert_eq!(requests[0].0, "http://localhost:9000/symbols/app.pdb/ABC1/app.pdb");
    assert_eq!(requests[0].1, "custom-agent");
}

#[tokio::test]
async fn test_download_for_binary_output_dir_wins() {
    let binary_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let (downloader, _fetcher, _extractor) = downloader(
        MockFetcher::available().serving("app.pd_", b"MSCF"),
        MockExtractor::working(),
    );
    let mut info = DebugInfo::new("app.pdb", "ABC1");
    info.binary_path = Some(binary_dir.path().join("app.exe"));
    let config = Config {
        output_dir: Some(output_dir.path().to_path_buf()),
        ..Default::default()
    };

    let result = downloader
        .download_for_binary(Some(&info), Some(&config))
        .await
        .unwrap();

    assert!(result.succeeded);
    assert_eq!(result.local_path, Some(output_dir.path().join("app.pdb")));
    assert!(result.local_path.unwrap().exists());
    assert!(dir_entries(&binary_dir).is_empty());
    assert_eq!(dir_entries(&output_dir), vec!["app.pdb"]);
}

#[tokio::test]
async fn test_capabilities() {
    let (downloader, _fetcher, _extractor) =
        downloader(MockFetcher::available(), MockExtractor::unavailable());
    assert_eq!(
        downloader.capabilities().await,
        ToolCapabilities {
            fetch: true,
            extract: false
        }
    );
}

#[tokio::test]
async fn test_from_config_without_path_search() {
    let config = Config {
        tools: crate::config::ToolsConfig {
            search_path: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let downloader = PdbDownloader::from_config(&config);

    assert_eq!(downloader.fetcher.name(), "noop");
    assert_eq!(downloader.extractor.name(), "noop");
    assert_eq!(
        downloader.capabilities().await,
        ToolCapabilities {
            fetch: false,
            extract: false
        }
    );
}

#[test]
fn test_from_config_in_process_backends() {
    let config = Config {
        fetch_backend: FetchBackend::Http,
        extract_backend: ExtractBackend::Builtin,
        ..Default::default()
    };
    let downloader = PdbDownloader::from_config(&config);

    assert_eq!(downloader.fetcher.name(), "http");
    assert_eq!(downloader.extractor.name(), "builtin-cab");
}

#[test]
fn test_from_config_explicit_tool_paths() {
    let config = Config {
        tools: crate::config::ToolsConfig {
            curl_path: Some(PathBuf::from("/opt/bin/curl")),
            cabextract_path: Some(PathBuf::from("/opt/bin/cabextract")),
            search_path: false,
        },
        ..Default::default()
    };
    let downloader = PdbDownloader::from_config(&config);

    assert_eq!(downloader.fetcher.name(), "curl");
    assert_eq!(downloader.extractor.name(), CabTool::for_platform().program());
    assert!(format!("{downloader:?}").contains("curl"));
}
