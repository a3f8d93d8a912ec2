use std::time::Duration;

use http::StatusCode;
use micro_call::client::Client;
use micro_call::protocol::{Request, Response, TransportError};
use micro_call::timeout::Timeout;
use micro_call::transport::transport_fn;
use micro_service::{Arguments, MethodMetadata, ParameterKind, Service, TypeRef};
use serde::Deserialize;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
pub struct User {
    id: u64,
    name: String,
}

// stands in for a real network transport
async fn in_memory(request: Request, _timeout: Timeout) -> Result<Response, TransportError> {
    let (status, body) = match (request.method().as_str(), request.uri().path()) {
        ("GET", "/v1/users/1") => (StatusCode::OK, r#"{"id":1,"name":"zava"}"#.to_string()),
        ("GET", "/v1/users") => (StatusCode::OK, r#"[{"id":1,"name":"zava"},{"id":2,"name":"ann"}]"#.to_string()),
        ("POST", "/v1/users") => {
            let form = request.body().map(|body| String::from_utf8_lossy(body.bytes()).into_owned()).unwrap_or_default();
            (StatusCode::CREATED, format!(r#"{{"id":3,"name":"{}"}}"#, form.trim_start_matches("name=")))
        }
        ("GET", "/v1/motd") => (StatusCode::OK, "have a nice day".to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    };
    Response::builder(request).status(status).body(body).map_err(TransportError::protocol)
}

fn declare(service: micro_service::ServiceBuilder) -> micro_service::ServiceBuilder {
    service
        .declare(
            MethodMetadata::builder("getUser")
                .get("users/{id}")
                .param(ParameterKind::path("id"))
                .returns(TypeRef::call(TypeRef::named("User")))
                .build(),
        )
        .declare(
            MethodMetadata::builder("listUsers")
                .get("users")
                .header("Accept: application/json")
                .param(ParameterKind::query("sort"))
                .returns(TypeRef::generic("Vec", [TypeRef::named("User")]))
                .build(),
        )
        .declare(
            MethodMetadata::builder("createUser")
                .post("users")
                .form_url_encoded()
                .param(ParameterKind::field("name"))
                .returns(TypeRef::call(TypeRef::named("User")))
                .build(),
        )
        .declare(
            MethodMetadata::builder("motd").get("motd").returns(TypeRef::pending(TypeRef::named("String"))).build(),
        )
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let client = Client::builder()
        .transport(transport_fn(in_memory))
        .call_timeout(Duration::from_secs(5))
        .build()
        .expect("a tokio runtime is running");

    let service = match declare(Service::builder().base_url("http://127.0.0.1:8080/v1/").call_factory(client))
        .validate_eagerly(true)
        .build()
    {
        Ok(service) => service,
        Err(e) => {
            error!(cause = %e, "invalid service declaration");
            return;
        }
    };

    // Call<User>: the caller decides when and how to run it
    let get_user = service.method::<User>("getUser").expect("declared above");
    if let Some(call) = get_user.invoke(&Arguments::new().arg(1)).await.ok().and_then(|i| i.into_call()) {
        match call.execute().await {
            Ok(user) => info!(?user, "fetched"),
            Err(e) => error!(cause = %e, "fetch failed"),
        }
    }

    // Vec<User>: executed before invoke returns
    let list_users = service.method::<Vec<User>>("listUsers").expect("declared above");
    match list_users.invoke(&Arguments::new().arg("name")).await.map(|i| i.into_value()) {
        Ok(Some(users)) => info!(count = users.len(), first = ?users.first().map(|u| u.id), "listed"),
        Ok(None) => unreachable!("listUsers executes directly"),
        Err(e) => error!(cause = %e, "list failed"),
    }

    let create_user = service.method::<User>("createUser").expect("declared above");
    match create_user.invoke(&Arguments::new().arg("bob")).await {
        Ok(invocation) => match invocation.resolve().await {
            Ok(user) => info!(id = user.id, name = %user.name, "created"),
            Err(e) => error!(cause = %e, "create failed"),
        },
        Err(e) => error!(cause = %e, "create failed"),
    }

    // Pending<String>: runs on the dispatcher
    let motd = service.method::<String>("motd").expect("declared above");
    match motd.invoke(&Arguments::new()).await.map(|i| i.resolve()) {
        Ok(pending) => match pending.await {
            Ok(text) => info!(%text, "message of the day"),
            Err(e) => error!(cause = %e, "motd failed"),
        },
        Err(e) => error!(cause = %e, "motd failed"),
    }
}
