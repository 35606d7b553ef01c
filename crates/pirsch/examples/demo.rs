// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: report page views and read statistics from an axum server.
//!
//! Run with:
//!   PIRSCH_CLIENT_ID=... PIRSCH_CLIENT_SECRET=... PIRSCH_HOSTNAME=example.com \
//!   cargo run --example demo -p pirsch
//!
//! Then open http://localhost:1414/, /event and /stats.

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use pirsch::{Filter, HitOptions, PirschClient, PirschClientBuilder};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pirsch=debug")),
		)
		.init();

	let client = PirschClientBuilder::from_env().build()?;

	let app = Router::new()
		.route("/", get(page))
		.route("/event", get(event))
		.route("/stats", get(stats))
		.with_state(client);

	let listener = tokio::net::TcpListener::bind("0.0.0.0:1414").await?;
	println!("Listening on http://localhost:1414");
	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}

async fn page(
	State(client): State<PirschClient>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	request: Request,
) -> Html<&'static str> {
	let options = HitOptions {
		ip: Some(addr.ip().to_string()),
		..Default::default()
	};

	if let Err(e) = client.hit_with_options(&request, &options).await {
		tracing::warn!(error = %e, "Failed to send hit");
	}

	Html("<h1>Hello from Pirsch</h1><p>This page view was reported.</p>")
}

async fn event(
	State(client): State<PirschClient>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	request: Request,
) -> Html<&'static str> {
	let options = HitOptions {
		ip: Some(addr.ip().to_string()),
		..Default::default()
	};

	let meta = [("hello", "world"), ("source", "demo")];
	if let Err(e) = client
		.event_with_options("Demo Event", 42, meta, &request, &options)
		.await
	{
		tracing::warn!(error = %e, "Failed to send event");
	}

	Html("<h1>Event sent</h1>")
}

async fn stats(State(client): State<PirschClient>) -> Html<String> {
	match render_stats(&client).await {
		Ok(body) => Html(body),
		Err(e) => Html(format!("<h1>Error</h1><pre>{e}</pre>")),
	}
}

async fn render_stats(client: &PirschClient) -> pirsch::Result<String> {
	let domain = client.domain().await?;
	let today = Utc::now().date_naive();
	let filter = Filter::new(domain.id.clone(), today - Duration::days(7), today).with_limit(10);

	let visitors = client.visitors(&filter).await?;
	let pages = client.pages(&filter).await?;
	let active = client.active_visitors(&filter).await?;

	let mut html = format!(
		"<h1>{}</h1><p>{} active visitors</p><h2>Visitors</h2><ul>",
		domain.hostname, active.visitors
	);
	for day in &visitors {
		let date = day
			.day
			.map(|d| d.date_naive().to_string())
			.unwrap_or_default();
		let _ = write!(html, "<li>{date}: {} visitors, {} views</li>", day.visitors, day.views);
	}
	html.push_str("</ul><h2>Pages</h2><ul>");
	for page in &pages {
		let _ = write!(html, "<li>{}: {} visitors</li>", page.path, page.visitors);
	}
	html.push_str("</ul>");

	Ok(html)
}
