mod service;

use clap::Parser;
use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

pub mod inventory {
    tonic::include_proto!("spaceone.api.inventory.v2");
}

pub mod identity {
    tonic::include_proto!("spaceone.api.identity.v2");
}

const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("fixture_descriptor");

#[derive(Parser, Debug)]
#[command(
    name = "fixture-server",
    about = "Reflection-enabled fixture gRPC server used by cfctl's integration tests"
)]
struct Cli {
    /// Port to listen on (0 for ephemeral)
    #[arg(short = 'p', long = "port", default_value_t = 0)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    println!("Listening on {local_addr}");

    let self_address = format!("grpc://{local_addr}");

    let server_service = inventory::server_server::ServerServer::new(service::ServerImpl::default());
    let user_service = identity::user_server::UserServer::new(service::UserImpl);
    let endpoint_service =
        identity::endpoint_server::EndpointServer::new(service::EndpointImpl::new(self_address));

    let reflection_v1 = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;
    let reflection_v1alpha = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1alpha()?;

    Server::builder()
        .add_service(reflection_v1)
        .add_service(reflection_v1alpha)
        .add_service(server_service)
        .add_service(user_service)
        .add_service(endpoint_service)
        .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
        .await?;

    Ok(())
}
