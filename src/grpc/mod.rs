//! # gRPC Surface
//!
//! Generated protobuf types, the `SecretsManagerService` implementation, and
//! server bootstrap with health checking, reflection, and graceful shutdown.

pub mod server;

pub use server::SecretsManagerApi;

/// Generated protobuf types for the sealbox.v1 service
pub mod proto {
    tonic::include_proto!("sealbox.v1");

    /// Descriptor set for gRPC server reflection
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("sealbox_descriptor");
}

use crate::config::GrpcConfig;
use crate::errors::{Error, Result};
use crate::services::SecretsManager;
use proto::secrets_manager_service_server::SecretsManagerServiceServer;
use std::future::Future;
use tonic::transport::Server;
use tracing::info;

/// Start the gRPC server with health, reflection, and graceful shutdown.
pub async fn start_grpc_server<F>(
    config: &GrpcConfig,
    service: SecretsManager,
    shutdown_signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| Error::config(format!("Invalid gRPC address: {}", e)))?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<SecretsManagerServiceServer<SecretsManagerApi>>()
        .await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build_v1()
        .map_err(|e| Error::internal(format!("Failed to build reflection service: {}", e)))?;

    let api = SecretsManagerApi::new(service);

    info!(address = %addr, "Starting secrets manager gRPC server");

    Server::builder()
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(SecretsManagerServiceServer::new(api))
        .serve_with_shutdown(addr, shutdown_signal)
        .await
        .map_err(|e| {
            let error_msg = e.to_string();
            if error_msg.contains("Address already in use") || error_msg.contains("bind") {
                Error::transport(format!(
                    "gRPC server failed to bind to {}: port {} is already in use",
                    addr,
                    addr.port()
                ))
            } else {
                Error::transport(format!("gRPC server failed: {}", e))
            }
        })?;

    info!("gRPC server stopped");

    Ok(())
}
