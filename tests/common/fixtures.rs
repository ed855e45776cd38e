//! Symbol server fixtures

use std::io::{Cursor, Write};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Symbol server key used by every fixture
pub const VERSION_ID: &str = "12345678123456789ABCDEF0012345672";

/// User agent the fixtures expect
pub const USER_AGENT: &str = "Microsoft-Symbol-Server/6.11.0001.402";

/// Stand-in PDB contents (MSF 7.0 magic followed by padding)
pub fn pdb_contents() -> Vec<u8> {
    let mut data = b"Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0".to_vec();
    data.resize(8192, 0xAB);
    data
}

/// Build a single-file cabinet holding `name`
pub fn cabinet_with(name: &str, contents: &[u8]) -> Vec<u8> {
    let mut builder = cab::CabinetBuilder::new();
    builder
        .add_folder(cab::CompressionType::MsZip)
        .add_file(name);
    let mut writer = builder
        .build(Cursor::new(Vec::new()))
        .expect("build cabinet");
    while let Some(mut file) = writer.next_file().expect("next cabinet file") {
        file.write_all(contents).expect("write cabinet file");
    }
    writer.finish().expect("finish cabinet").into_inner()
}

/// Serve `body` for `<debug_file>/<VERSION_ID>/<archive>` on `server`
pub async fn serve(server: &MockServer, debug_file: &str, archive: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/symbols/{debug_file}/{VERSION_ID}/{archive}")))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Base URL of the symbol store on `server`
pub fn symbol_server_url(server: &MockServer) -> String {
    format!("{}/symbols", server.uri())
}
