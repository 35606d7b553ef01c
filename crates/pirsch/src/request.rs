// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Builds hit payloads from inbound `http::Request`s.

use std::net::SocketAddr;

use http::header::{AsHeaderName, ACCEPT_LANGUAGE, FORWARDED, HOST, REFERER, USER_AGENT};
use http::Request;
use pirsch_core::Hit;

/// Query parameters checked, in order, when the request has no Referer header.
pub const REFERRER_QUERY_PARAMS: [&str; 5] = ["ref", "referer", "referrer", "source", "utm_source"];

const DNT: &str = "dnt";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_REAL_IP: &str = "x-real-ip";

/// Values the inbound request cannot provide.
#[derive(Debug, Clone, Default)]
pub struct HitOptions {
	pub screen_width: u32,
	pub screen_height: u32,
	/// Overrides the peer address. Set this when the server framework keeps
	/// the remote address somewhere other than a `SocketAddr` extension.
	pub ip: Option<String>,
}

/// True when the client sent `DNT: 1`.
pub fn do_not_track<B>(request: &Request<B>) -> bool {
	header(request, DNT) == "1"
}

/// The Referer header, or the first non-empty referrer-like query parameter.
pub fn referrer<B>(request: &Request<B>) -> String {
	let referer = header(request, REFERER);
	if !referer.is_empty() {
		return referer;
	}

	let Some(query) = request.uri().query() else {
		return String::new();
	};

	REFERRER_QUERY_PARAMS
		.iter()
		.find_map(|param| {
			url::form_urlencoded::parse(query.as_bytes())
				.find(|(name, _)| name == param)
				.map(|(_, value)| value.into_owned())
				.filter(|value| !value.is_empty())
		})
		.unwrap_or_default()
}

/// Collects the page hit for `request`.
pub fn hit_from_request<B>(hostname: &str, request: &Request<B>, options: &HitOptions) -> Hit {
	let ip = options.ip.clone().unwrap_or_else(|| {
		request
			.extensions()
			.get::<SocketAddr>()
			.map(|addr| addr.ip().to_string())
			.unwrap_or_default()
	});

	Hit {
		hostname: hostname.to_string(),
		url: page_url(request),
		ip,
		cf_connecting_ip: header(request, CF_CONNECTING_IP),
		x_forwarded_for: header(request, X_FORWARDED_FOR),
		forwarded: header(request, FORWARDED),
		x_real_ip: header(request, X_REAL_IP),
		user_agent: header(request, USER_AGENT),
		accept_language: header(request, ACCEPT_LANGUAGE),
		referrer: referrer(request),
		screen_width: options.screen_width,
		screen_height: options.screen_height,
	}
}

/// Server-side URIs are usually origin-form, so the absolute URL is rebuilt
/// from the Host header.
fn page_url<B>(request: &Request<B>) -> String {
	let uri = request.uri();
	if uri.scheme().is_some() {
		return uri.to_string();
	}

	let path = uri
		.path_and_query()
		.map(|pq| pq.as_str())
		.unwrap_or("/");
	let host = header(request, HOST);
	if host.is_empty() {
		return path.to_string();
	}

	let scheme = match header(request, X_FORWARDED_PROTO) {
		proto if proto.is_empty() => "http".to_string(),
		proto => proto,
	};
	format!("{scheme}://{host}{path}")
}

fn header<B, K: AsHeaderName>(request: &Request<B>, name: K) -> String {
	request
		.headers()
		.get(name)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default()
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn get(uri: &str) -> http::request::Builder {
		Request::builder().method("GET").uri(uri)
	}

	#[test]
	fn test_referrer_from_header_or_query() {
		let cases = [
			("https://example.com", "", ""),
			("https://example.com", "https://referrer.com", "https://referrer.com"),
			("https://example.com/?ref=https://referrer.com", "", "https://referrer.com"),
			("https://example.com/?referer=Referrer", "", "Referrer"),
			("https://example.com/?referrer=Referrer", "", "Referrer"),
			("https://example.com/?source=Source", "", "Source"),
			("https://example.com/?utm_source=Source", "", "Source"),
			("https://example.com/?ref=Referrer+Name", "", "Referrer Name"),
			(
				"https://example.com/?ref=from-query",
				"https://header.com",
				"https://header.com",
			),
		];

		for (uri, referer, expected) in cases {
			let mut builder = get(uri);
			if !referer.is_empty() {
				builder = builder.header(REFERER, referer);
			}
			let request = builder.body(()).unwrap();
			assert_eq!(referrer(&request), expected, "uri {uri}");
		}
	}

	#[test]
	fn test_referrer_skips_empty_parameters() {
		let request = get("/?ref=&source=newsletter").body(()).unwrap();
		assert_eq!(referrer(&request), "newsletter");
	}

	#[test]
	fn test_referrer_parameter_precedence() {
		let request = get("/?utm_source=utm&ref=ref").body(()).unwrap();
		assert_eq!(referrer(&request), "ref");
	}

	#[test]
	fn test_do_not_track() {
		let tracked = get("/").body(()).unwrap();
		let dnt = get("/").header("DNT", "1").body(()).unwrap();
		let dnt_off = get("/").header("DNT", "0").body(()).unwrap();

		assert!(!do_not_track(&tracked));
		assert!(do_not_track(&dnt));
		assert!(!do_not_track(&dnt_off));
	}

	#[test]
	fn test_hit_from_request_collects_headers() {
		let mut request = get("/blog/post?utm_source=newsletter")
			.header(HOST, "example.com")
			.header("X-Forwarded-Proto", "https")
			.header("CF-Connecting-IP", "203.0.113.1")
			.header("X-Forwarded-For", "203.0.113.2, 10.0.0.1")
			.header(FORWARDED, "for=203.0.113.3")
			.header("X-Real-IP", "203.0.113.4")
			.header(USER_AGENT, "Mozilla/5.0")
			.header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
			.body(())
			.unwrap();
		request
			.extensions_mut()
			.insert("192.0.2.10:51234".parse::<SocketAddr>().unwrap());

		let options = HitOptions {
			screen_width: 1920,
			screen_height: 1080,
			ip: None,
		};
		let hit = hit_from_request("example.com", &request, &options);

		assert_eq!(hit.hostname, "example.com");
		assert_eq!(hit.url, "https://example.com/blog/post?utm_source=newsletter");
		assert_eq!(hit.ip, "192.0.2.10");
		assert_eq!(hit.cf_connecting_ip, "203.0.113.1");
		assert_eq!(hit.x_forwarded_for, "203.0.113.2, 10.0.0.1");
		assert_eq!(hit.forwarded, "for=203.0.113.3");
		assert_eq!(hit.x_real_ip, "203.0.113.4");
		assert_eq!(hit.user_agent, "Mozilla/5.0");
		assert_eq!(hit.accept_language, "en-US,en;q=0.9");
		assert_eq!(hit.referrer, "newsletter");
		assert_eq!(hit.screen_width, 1920);
		assert_eq!(hit.screen_height, 1080);
	}

	#[test]
	fn test_ip_option_overrides_peer_address() {
		let mut request = get("/").body(()).unwrap();
		request
			.extensions_mut()
			.insert("192.0.2.10:51234".parse::<SocketAddr>().unwrap());
		let options = HitOptions {
			ip: Some("198.51.100.7".to_string()),
			..Default::default()
		};

		let hit = hit_from_request("example.com", &request, &options);
		assert_eq!(hit.ip, "198.51.100.7");
	}

	#[test]
	fn test_page_url() {
		let absolute = get("https://example.com/a?b=c").body(()).unwrap();
		assert_eq!(page_url(&absolute), "https://example.com/a?b=c");

		let origin_form = get("/a").header(HOST, "example.com").body(()).unwrap();
		assert_eq!(page_url(&origin_form), "http://example.com/a");

		let no_host = get("/a?b=c").body(()).unwrap();
		assert_eq!(page_url(&no_host), "/a?b=c");
	}
}
