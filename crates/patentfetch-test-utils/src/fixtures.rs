//! Canned pages, PDF bodies and configs pointing at a local mock server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use patentfetch_config::RetrievalConfig;

/// A detail page shaped like the real one: metadata, a download link per
/// entry in `pdf_links` (in order), and unrelated links around them.
pub fn detail_page_html(pdf_links: &[&str]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html><head><title>Patent</title>
<meta name="citation_patent_number" content="US:1234567">
</head><body><h1 id="title">Widget assembly</h1>
<a href="https://example.com/about.pdf">About</a>
"#,
    );
    for link in pdf_links {
        html.push_str(&format!(
            "<a href=\"{link}\" class=\"style-scope patent-result\">Download PDF</a>\n"
        ));
    }
    html.push_str("<section itemprop=\"description\">...</section></body></html>\n");
    html
}

/// `len` bytes starting with a PDF header.
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let header = b"%PDF-1.4\n";
    let mut bytes = Vec::with_capacity(len.max(header.len()));
    bytes.extend_from_slice(header);
    let mut i: u8 = 0;
    while bytes.len() < len {
        bytes.push(i);
        i = i.wrapping_add(31);
    }
    bytes
}

/// Retrieval settings aimed at a mock server: detail pages under
/// `<server>/patent/`, assets under `<server>/`, no delay.
pub fn retrieval_config(server_url: &str) -> RetrievalConfig {
    RetrievalConfig {
        detail_base_url: format!("{server_url}/patent/"),
        asset_host: server_url.to_string(),
        inter_item_delay_ms: 0,
        http_timeout_secs: 5,
        ..RetrievalConfig::default()
    }
}

/// Write a CSV with one header and one column of values.
pub fn write_single_column_csv(dir: &Path, header: &str, values: &[&str]) -> PathBuf {
    let path = dir.join("patents.csv");
    let mut content = format!("{header}\n");
    for v in values {
        content.push_str(&format!("\"{}\"\n", v.replace('"', "\"\"")));
    }
    std::fs::write(&path, content).expect("write csv fixture");
    path
}

/// One-shot HTTP server on 127.0.0.1 for responses mockito cannot produce
/// (bodies shorter than their Content-Length, replies that never come).
/// Reads the request head, writes `response` verbatim, keeps the socket
/// open for `hold`, then closes it. Returns the base URL.
pub fn raw_http_once(response: Vec<u8>, hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind raw server");
    let addr = listener.local_addr().expect("raw server address");
    std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else { return };
        let mut head = Vec::new();
        let mut buf = [0u8; 4096];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(&response);
        let _ = stream.flush();
        std::thread::sleep(hold);
    });
    format!("http://{addr}")
}

/// A 200 PDF response declaring `declared` bytes but carrying `sent`.
pub fn truncated_pdf_response(declared: usize, sent: usize) -> Vec<u8> {
    let mut resp = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
    )
    .into_bytes();
    resp.extend(pdf_bytes(sent));
    resp
}

/// Compare line by line with a readable diff on mismatch.
pub fn assert_lines_eq(actual: &str, expected: &[&str]) {
    let actual: Vec<&str> = actual.lines().collect();
    pretty_assertions::assert_eq!(actual, expected.to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_bytes_has_header_and_length() {
        let b = pdf_bytes(100);
        assert_eq!(b.len(), 100);
        assert_eq!(&b[..5], b"%PDF-");
    }

    #[test]
    fn test_truncated_response_declares_more_than_it_sends() {
        let resp = truncated_pdf_response(1000, 10);
        let text = String::from_utf8_lossy(&resp);
        assert!(text.contains("Content-Length: 1000\r\n"));
        let body_start = text.find("\r\n\r\n").unwrap() + 4;
        assert_eq!(resp.len() - body_start, 10);
    }

    #[test]
    fn test_detail_page_keeps_link_order() {
        let html = detail_page_html(&["A.pdf", "B.pdf"]);
        assert!(html.find("A.pdf").unwrap() < html.find("B.pdf").unwrap());
    }
}
