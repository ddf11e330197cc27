//! Wire dumps for `debugClient`.
//!
//! Emitted on the `argocd_endpoint::http_dump` target so they can be routed
//! or filtered independently of the controller logs.

use std::fmt::Write;

use reqwest::header::HeaderMap;
use reqwest::{Request, StatusCode, Version};

pub(crate) fn request(req: &Request) {
    let url = req.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = format!("{} {} HTTP/1.1\r\n", req.method(), target);
    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {host}:{port}\r\n");
            }
            None => {
                let _ = write!(out, "Host: {host}\r\n");
            }
        }
    }
    write_headers(&mut out, req.headers());
    out.push_str("\r\n");
    if let Some(body) = req.body().and_then(|b| b.as_bytes()) {
        out.push_str(&String::from_utf8_lossy(body));
    }

    emit(&out);
}

pub(crate) fn response(version: Version, status: StatusCode, headers: &HeaderMap, body: &[u8]) {
    let mut out = format!("{version:?} {status}\r\n");
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));

    emit(&out);
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        let _ = write!(out, "{name}: {value}\r\n");
    }
}

fn emit(dump: &str) {
    tracing::info!(target: "argocd_endpoint::http_dump", "{dump}\n");
}
