use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    gatelink_client::{GatewayService, HttpGateway, credential_source_from_config},
    gatelink_config::GatelinkConfig,
    gatelink_protocol::{RouteDescriptor, ServiceIdentity},
    gatelink_routing::RouteManifest,
    secrecy::ExposeSecret,
    tracing::{info, warn},
};

pub async fn ping(config: &GatelinkConfig) -> Result<()> {
    let api = HttpGateway::with_timeout(&config.gateway.url, config.gateway.request_timeout())?;
    let identity = ServiceIdentity::new(
        config.service.name.as_str(),
        config.service.address.as_str(),
        config.service.protocol.as_str(),
    );
    let service = GatewayService::new(identity, Arc::new(api));
    println!("{}", service.ping().await);
    Ok(())
}

pub async fn token(config: &GatelinkConfig) -> Result<()> {
    let timeout = config.gateway.request_timeout();
    let Some(source) = credential_source_from_config(&config.credentials, timeout)? else {
        println!("No credential source configured; registration is unauthenticated.");
        return Ok(());
    };

    let secret = source
        .get_token()
        .await
        .with_context(|| format!("reading credential from {}", source.name()))?;
    if secret.expose_secret().is_empty() {
        bail!("{} returned an empty credential", source.name());
    }
    println!("Credential available from {}.", source.name());
    Ok(())
}

pub fn routes(config: &GatelinkConfig, manifest: &Path, service: Option<&str>) -> Result<()> {
    let service = service.unwrap_or(&config.service.name);
    if service.is_empty() {
        bail!("no service name: pass --service or set service.name in config");
    }
    let routes = manifest_routes(manifest, service)?;
    println!("{}", serde_json::to_string_pretty(&routes)?);
    Ok(())
}

pub async fn connect(config: &GatelinkConfig, manifest: &Path) -> Result<()> {
    let service = GatewayService::from_config(config)?;
    let mut catalog = RouteManifest::load(manifest)?.into_catalog();

    let report = service.connect(catalog.transport()).await?;
    println!(
        "registered: {}, routes: {}/{}",
        report.registered, report.routes_submitted, report.routes_total
    );
    if let Some(err) = &report.route_error {
        warn!(error = %err, "route publication incomplete");
    }

    info!("heartbeating, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    report.heartbeat.shutdown().await;
    info!("heartbeat stopped");
    Ok(())
}

fn manifest_routes(manifest: &Path, service: &str) -> Result<Vec<RouteDescriptor>> {
    let mut catalog = RouteManifest::load(manifest)?.into_catalog();
    let mut transport = catalog.transport();
    transport.prepare();
    Ok(transport.enumerate_routes(service))
}
