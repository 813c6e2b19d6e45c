//! Metrics server module
//!
//! This module provides an HTTP server to expose Prometheus metrics for scraping.

use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use tracing::{error, info};

use crate::utils::{
	constants::DEFAULT_METRICS_ADDRESS,
	metrics::{gather_metrics, update_system_metrics},
};

/// Metrics endpoint handler
async fn metrics_handler() -> impl Responder {
	update_system_metrics();

	match gather_metrics() {
		Ok(buffer) => HttpResponse::Ok()
			.content_type("text/plain; version=0.0.4; charset=utf-8")
			.body(buffer),
		Err(e) => {
			error!("Error gathering metrics: {}", e);
			HttpResponse::InternalServerError().finish()
		}
	}
}

/// Address the metrics server listens on.
///
/// `METRICS_ADDRESS` (`HOST:PORT`) takes precedence over `METRICS_PORT`, which binds to localhost.
pub fn metrics_address_from_env() -> String {
	resolve_metrics_address(
		std::env::var("METRICS_ADDRESS").ok(),
		std::env::var("METRICS_PORT").ok(),
	)
}

fn resolve_metrics_address(address: Option<String>, port: Option<String>) -> String {
	match (address, port) {
		(Some(address), _) => address,
		(None, Some(port)) => format!("127.0.0.1:{}", port),
		(None, None) => DEFAULT_METRICS_ADDRESS.to_string(),
	}
}

/// Inside a container the server listens on all interfaces, keeping the configured port
fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.split(':').nth(1) {
		Some(port) => format!("0.0.0.0:{}", port),
		None => "0.0.0.0:8081".to_string(),
	}
}

/// Creates the metrics server. The returned server must be awaited (or spawned) to run.
pub fn create_metrics_server(bind_address: String) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(&bind_address, in_docker);

	info!(
		"Starting metrics server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	Ok(HttpServer::new(|| {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.route("/metrics", web::get().to(metrics_handler))
	})
	.workers(2)
	.bind(actual_bind_address)?
	.shutdown_timeout(5)
	.run())
}
