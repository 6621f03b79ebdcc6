//! Development server for vitrine
//!
//! A minimal static file server. No dependencies beyond tiny_http.
//! Serves the page shell, the host wasm, and the guest module.

use std::fs;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Response, Server};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROOT: &str = "web";

fn main() {
    let port = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let root = std::env::args().nth(2).unwrap_or_else(|| DEFAULT_ROOT.to_string());

    let addr = format!("0.0.0.0:{}", port);
    let server = Server::http(&addr).expect("Failed to start server");

    println!("vitrine dev server");
    println!("  serving ./{} at http://localhost:{}", root, port);

    for request in server.incoming_requests() {
        let url_path = request.url().to_string();
        let file_path = if url_path == "/" {
            "index.html".to_string()
        } else {
            url_path.trim_start_matches('/').to_string()
        };

        let response = serve_file(&PathBuf::from(&root).join(file_path));
        let _ = request.respond(response);
    }
}

fn serve_file(path: &Path) -> Response<std::io::Cursor<Vec<u8>>> {
    match fs::read(path) {
        Ok(contents) => {
            let mime = mime_type(path);
            let header = Header::from_bytes("Content-Type", mime).unwrap();
            Response::from_data(contents).with_header(header)
        }
        Err(_) => Response::from_string("404 Not Found")
            .with_status_code(404)
            .with_header(Header::from_bytes("Content-Type", "text/plain").unwrap()),
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
