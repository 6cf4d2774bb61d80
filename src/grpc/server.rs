//! `SecretsManagerService` gRPC implementation.
//!
//! Thin translation layer: requests are handed to the domain service, and
//! domain errors are mapped to gRPC status codes here. `DecryptionFailed` and
//! infrastructure errors surface as generic statuses; their detail exists
//! only in server-side logs.

use crate::errors::Error;
use crate::grpc::proto::{
    secrets_manager_service_server::SecretsManagerService, CreateAsymmetricKeyPairRequest,
    CreateAsymmetricKeyPairResponse, CreateSecretRequest, CreateSecretResponse,
    CreateSymmetricKeyRequest, CreateSymmetricKeyResponse, GetAsymmetricKeyPairByKeyNameRequest,
    GetAsymmetricKeyPairByKeyNameResponse, GetSecretByNameRequest, GetSecretByNameResponse,
    GetSymmetricKeyByKeyNameRequest, GetSymmetricKeyByKeyNameResponse, ReturnKeyType,
};
use crate::services::{KeyPairMaterial, ReturnKeyType as DomainReturnKeyType, SecretsManager};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// gRPC-facing wrapper around the domain service.
#[derive(Debug, Clone)]
pub struct SecretsManagerApi {
    service: Arc<SecretsManager>,
}

impl SecretsManagerApi {
    pub fn new(service: SecretsManager) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Map a domain error to the gRPC status surface.
///
/// Client errors keep their message; data-integrity and infrastructure
/// errors are logged with full context and replaced by generic statuses so
/// no oracle information leaks to callers.
fn status_from_error(err: Error) -> Status {
    match err {
        Error::Validation { message, .. } => Status::invalid_argument(message),
        Error::NotFound { .. } => Status::not_found(err.to_string()),
        Error::Conflict { .. } => Status::already_exists(err.to_string()),
        Error::DecryptionFailed => {
            tracing::error!("Decryption failed while serving request");
            Status::internal("internal error")
        }
        Error::Database { ref source, ref context } => {
            tracing::error!(error = %source, context = %context, "Storage error while serving request");
            Status::unavailable("storage unavailable")
        }
        other => {
            tracing::error!(error = %other, "Internal error while serving request");
            Status::internal("internal error")
        }
    }
}

fn to_proto_timestamp(dt: chrono::DateTime<chrono::Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

#[tonic::async_trait]
impl SecretsManagerService for SecretsManagerApi {
    async fn create_secret(
        &self,
        request: Request<CreateSecretRequest>,
    ) -> Result<Response<CreateSecretResponse>, Status> {
        let req = request.into_inner();

        let created = self
            .service
            .create_secret(&req.key_name, &req.value)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(CreateSecretResponse {
            key_name: created.key_name,
            created_at: Some(to_proto_timestamp(created.created_at)),
        }))
    }

    async fn get_secret_by_name(
        &self,
        request: Request<GetSecretByNameRequest>,
    ) -> Result<Response<GetSecretByNameResponse>, Status> {
        let req = request.into_inner();

        let secret = self
            .service
            .get_secret_by_name(&req.key_name)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(GetSecretByNameResponse {
            key_name: secret.key_name,
            value: secret.value.to_vec(),
        }))
    }

    async fn create_symmetric_key(
        &self,
        request: Request<CreateSymmetricKeyRequest>,
    ) -> Result<Response<CreateSymmetricKeyResponse>, Status> {
        let req = request.into_inner();

        let created = self
            .service
            .create_symmetric_key(&req.key_name)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(CreateSymmetricKeyResponse {
            key_name: created.key_name,
            created_at: Some(to_proto_timestamp(created.created_at)),
        }))
    }

    async fn get_symmetric_key_by_key_name(
        &self,
        request: Request<GetSymmetricKeyByKeyNameRequest>,
    ) -> Result<Response<GetSymmetricKeyByKeyNameResponse>, Status> {
        let req = request.into_inner();

        let key = self
            .service
            .get_symmetric_key_by_name(&req.key_name)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(GetSymmetricKeyByKeyNameResponse {
            key_name: key.key_name,
            key_material: key.key_material.to_vec(),
        }))
    }

    async fn create_asymmetric_key_pair(
        &self,
        request: Request<CreateAsymmetricKeyPairRequest>,
    ) -> Result<Response<CreateAsymmetricKeyPairResponse>, Status> {
        let req = request.into_inner();

        let created = self
            .service
            .create_asymmetric_key_pair(&req.key_name)
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(CreateAsymmetricKeyPairResponse {
            key_name: created.key_name,
            public_key: created.public_key_pem,
            created_at: Some(to_proto_timestamp(created.created_at)),
        }))
    }

    async fn get_asymmetric_key_pair_by_key_name(
        &self,
        request: Request<GetAsymmetricKeyPairByKeyNameRequest>,
    ) -> Result<Response<GetAsymmetricKeyPairByKeyNameResponse>, Status> {
        let req = request.into_inner();

        // The wire default (UNSPECIFIED) behaves as PUBLIC.
        let return_key_type = match req.return_key_type() {
            ReturnKeyType::Unspecified | ReturnKeyType::Public => DomainReturnKeyType::Public,
            ReturnKeyType::Pair => DomainReturnKeyType::Pair,
        };

        let view = self
            .service
            .get_asymmetric_key_pair_by_name(&req.key_name, return_key_type)
            .await
            .map_err(status_from_error)?;

        let response = match view.material {
            KeyPairMaterial::PublicOnly { public_key_pem } => GetAsymmetricKeyPairByKeyNameResponse {
                key_name: view.key_name,
                public_key: public_key_pem,
                private_key: None,
            },
            KeyPairMaterial::Pair {
                public_key_pem,
                private_key_pem,
            } => GetAsymmetricKeyPairByKeyNameResponse {
                key_name: view.key_name,
                public_key: public_key_pem,
                private_key: Some(private_key_pem.to_string()),
            },
        };

        Ok(Response::new(response))
    }
}
