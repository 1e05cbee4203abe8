use std::sync::Arc;

use rust_decimal::Decimal;
use service_ledger::config::{BootstrapUser, Config};
use service_ledger::domain::sheet_import::HttpSpreadsheetSource;
use service_ledger::storage::DbConnection;
use service_ledger::{create_router, initialize_with};
use service_ledger_client::{ApiClient, ChartsQuery, ClientError, Credentials};
use shared::{CreateTransactionRequest, Role, TransactionListRequest, Worker};

struct TestServer {
    base_url: String,
    // dropping it deletes the database
    _dir: tempfile::TempDir,
}

/// Serve a fresh backend on an ephemeral port
async fn spawn_server() -> TestServer {
    let mut config = Config::embedded_default().unwrap();
    config.auth.jwt_secret = "client-test-secret".to_string();
    config.auth.users = vec![
        BootstrapUser {
            username: "admin".to_string(),
            password: "clave-admin".to_string(),
            role: Role::Admin,
            worker: None,
        },
        BootstrapUser {
            username: "marleni".to_string(),
            password: "clave-marleni".to_string(),
            role: Role::Employee,
            worker: Some(Worker::Marleni),
        },
    ];

    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite:{}", dir.path().join("ledger.db").display());
    let db = DbConnection::new(&db_url).await.unwrap();
    let state = initialize_with(db, &config, Arc::new(HttpSpreadsheetSource::new()))
        .await
        .unwrap();
    let app = create_router(state, &[]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        _dir: dir,
    }
}

fn service(worker: &str, earnings: Decimal) -> CreateTransactionRequest {
    CreateTransactionRequest {
        worker: worker.to_string(),
        service_name: "SERVICIO DE COPIA A COLOR".to_string(),
        client: Some("Lucia Gomez".to_string()),
        time: None,
        earnings,
        date: chrono::NaiveDate::from_ymd_opt(2024, 6, 3),
    }
}

#[tokio::test]
async fn test_admin_workflow() {
    let server = spawn_server().await;
    let client = ApiClient::new(server.base_url.clone());

    let me = client.login("admin", "clave-admin").await.unwrap();
    assert_eq!(me.role, Role::Admin);

    let created = client.create_transaction(&service("marleni", Decimal::new(4000, 2))).await.unwrap();
    client.create_transaction(&service("THAICAR", Decimal::new(10, 0))).await.unwrap();

    let updated = client.update_comment(created.id, "revisado").await.unwrap();
    assert_eq!(updated.comment.as_deref(), Some("revisado"));

    let stats = client.admin_stats().await.unwrap();
    assert_eq!(stats.admin_total, Decimal::new(25, 0));

    let charts = client
        .charts(&ChartsQuery {
            show_all: true,
            ..ChartsQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(charts.frequency.len(), 30);

    client.delete_transaction(created.id).await.unwrap();
    let missing = client.delete_transaction(created.id).await;
    assert!(matches!(missing, Err(ClientError::NotFound(_))));
}

#[tokio::test]
async fn test_errors_are_typed() {
    let server = spawn_server().await;
    let client = ApiClient::new(server.base_url.clone());

    assert_eq!(
        client.list_transactions(&TransactionListRequest::default()).await,
        Err(ClientError::SessionExpired)
    );
    assert_eq!(client.login("admin", "wrong").await, Err(ClientError::InvalidCredentials));

    client.login("marleni", "clave-marleni").await.unwrap();
    let forbidden = client.create_transaction(&service("MARLENI", Decimal::ONE)).await;
    assert!(matches!(forbidden, Err(ClientError::Forbidden(_))));

    let own = client.employee_sheet(None, &TransactionListRequest::default()).await.unwrap();
    assert_eq!(own.worker, Worker::Marleni);
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let server = spawn_server().await;
    let client = ApiClient::new(server.base_url.clone());
    client.login("admin", "clave-admin").await.unwrap();

    let real = client.session().credentials().await.unwrap();
    client
        .session()
        .set_credentials(Credentials {
            access_token: "expired-token".to_string(),
            refresh_token: real.refresh_token.clone(),
        })
        .await;

    let transactions = client.list_transactions(&TransactionListRequest::default()).await.unwrap();
    assert!(transactions.is_empty());

    let refreshed = client.session().access_token().await.unwrap();
    assert_ne!(refreshed, "expired-token");
}

#[tokio::test]
async fn test_revoked_session_expires() {
    let server = spawn_server().await;
    let client = ApiClient::new(server.base_url.clone());
    client.login("admin", "clave-admin").await.unwrap();

    let real = client.session().credentials().await.unwrap();
    client.logout().await.unwrap();
    client
        .session()
        .set_credentials(Credentials {
            access_token: "expired-token".to_string(),
            refresh_token: real.refresh_token,
        })
        .await;

    assert_eq!(client.admin_stats().await, Err(ClientError::SessionExpired));
    assert_eq!(client.session().credentials().await, None);
}
