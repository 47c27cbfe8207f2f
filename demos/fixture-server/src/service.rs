use std::sync::atomic::{AtomicUsize, Ordering};

use tonic::{Request, Response, Status};

use crate::identity::{
    endpoint_server::Endpoint, user_server::User, EndpointListRequest, EndpointListResponse,
    EndpointRecord, UserCreateRequest, UserGetRequest, UserRecord,
};
use crate::inventory::{
    server_server::Server as ServerService, ServerGetRequest, ServerListRequest,
    ServerListResponse, ServerRecord,
};

/// Inventory `Server` resource. `list` grows on each call so integration
/// tests can exercise watch-loop diffing without a second fixture binary.
#[derive(Default)]
pub struct ServerImpl {
    calls: AtomicUsize,
}

#[tonic::async_trait]
impl ServerService for ServerImpl {
    async fn list(
        &self,
        _request: Request<ServerListRequest>,
    ) -> Result<Response<ServerListResponse>, Status> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let mut results = vec![ServerRecord {
            server_id: "s-1".to_string(),
            name: "server-one".to_string(),
            region: "us-east-1".to_string(),
        }];
        if call > 0 {
            results.push(ServerRecord {
                server_id: "s-2".to_string(),
                name: "server-two".to_string(),
                region: "us-west-2".to_string(),
            });
        }

        Ok(Response::new(ServerListResponse { results }))
    }

    async fn get(
        &self,
        request: Request<ServerGetRequest>,
    ) -> Result<Response<ServerRecord>, Status> {
        let server_id = request.into_inner().server_id;
        if server_id.is_empty() {
            return Err(Status::invalid_argument(
                "ERROR_REQUIRED_PARAMETER (key = server_id)",
            ));
        }

        Ok(Response::new(ServerRecord {
            server_id: server_id.clone(),
            name: format!("server-{server_id}"),
            region: "us-east-1".to_string(),
        }))
    }
}

/// Identity `User` resource.
pub struct UserImpl;

#[tonic::async_trait]
impl User for UserImpl {
    async fn get(&self, request: Request<UserGetRequest>) -> Result<Response<UserRecord>, Status> {
        let user_id = request.into_inner().user_id;
        if user_id.is_empty() {
            return Err(Status::invalid_argument(
                "ERROR_REQUIRED_PARAMETER (key = user_id)",
            ));
        }

        Ok(Response::new(UserRecord {
            user_id: user_id.clone(),
            name: format!("user-{user_id}"),
            email: format!("{user_id}@example.com"),
        }))
    }

    async fn create(
        &self,
        request: Request<UserCreateRequest>,
    ) -> Result<Response<UserRecord>, Status> {
        let req = request.into_inner();
        if req.email.is_empty() {
            return Err(Status::invalid_argument(
                "ERROR_REQUIRED_PARAMETER (key = email)",
            ));
        }

        let user_id = if req.user_id.is_empty() {
            req.name.to_lowercase().replace(' ', "-")
        } else {
            req.user_id
        };

        Ok(Response::new(UserRecord {
            user_id,
            name: req.name,
            email: req.email,
        }))
    }
}

/// Identity `Endpoint` resource. Reports this same process as the
/// backend for both `inventory` and `identity` since the fixture server
/// hosts every service on one port.
pub struct EndpointImpl {
    self_address: String,
}

impl EndpointImpl {
    pub fn new(self_address: String) -> Self {
        Self { self_address }
    }
}

#[tonic::async_trait]
impl Endpoint for EndpointImpl {
    async fn list(
        &self,
        _request: Request<EndpointListRequest>,
    ) -> Result<Response<EndpointListResponse>, Status> {
        let results = vec![
            EndpointRecord {
                service: "inventory".to_string(),
                endpoint: self.self_address.clone(),
            },
            EndpointRecord {
                service: "identity".to_string(),
                endpoint: self.self_address.clone(),
            },
        ];

        Ok(Response::new(EndpointListResponse { results }))
    }
}
