use actix_web::{web, HttpResponse};

use super::schemas;
use crate::{chain, db_helpers, types};

/// Reports whether the Ethereum node and the database are reachable.
/// Any unreachable dependency turns the status into `degraded` and the response into 503.
pub async fn get_health(
    chain: web::Data<chain::ChainClient>,
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
) -> HttpResponse {
    let (ethereum, database) = futures::join!(
        chain.check_connection(),
        db_helpers::check_connection(&pool)
    );
    if let Err(err) = &ethereum {
        tracing::warn!(target: crate::LOGGER_MSG, "Health check: ethereum is down: {}", err);
    }
    if let Err(err) = &database {
        tracing::warn!(target: crate::LOGGER_MSG, "Health check: database is down: {}", err);
    }

    let status = if ethereum.is_ok() && database.is_ok() {
        schemas::HealthStatus::Ok
    } else {
        schemas::HealthStatus::Degraded
    };
    let body = types::ApiResponse {
        success: status == schemas::HealthStatus::Ok,
        message: status.to_string(),
        data: Some(schemas::HealthResponse {
            status,
            api: schemas::ComponentStatus::Running,
            ethereum: (&ethereum).into(),
            database: (&database).into(),
        }),
        error: None,
    };

    match status {
        schemas::HealthStatus::Ok => HttpResponse::Ok().json(body),
        schemas::HealthStatus::Degraded => HttpResponse::ServiceUnavailable().json(body),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test as actix_test, App};

    use super::*;
    use crate::modules::tests::*;

    async fn health(chain: chain::ChainClient) -> (StatusCode, serde_json::Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(chain))
                .app_data(web::Data::new(unreachable_pool()))
                .configure(crate::modules::health::register_services),
        )
        .await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        (response.status(), actix_test::read_body_json(response).await)
    }

    #[actix_web::test]
    async fn test_database_down_degrades() {
        let (status, body) = health(fake_chain()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "degraded");
        assert_eq!(
            body["data"],
            serde_json::json!({
                "status": "degraded",
                "api": "running",
                "ethereum": "connected",
                "database": "disconnected",
            })
        );
    }

    #[actix_web::test]
    async fn test_each_component_reported_independently() {
        let chain = chain::ChainClient::new(Arc::new(FakeChain::unreachable()));
        let (status, body) = health(chain).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["data"]["ethereum"], "disconnected");
        assert_eq!(body["data"]["database"], "disconnected");
        assert_eq!(body["data"]["api"], "running");
    }

    #[test]
    fn test_component_status_from_check() {
        let ok: crate::Result<()> = Ok(());
        assert_eq!(schemas::ComponentStatus::from(&ok), schemas::ComponentStatus::Connected);
        assert_eq!(schemas::HealthStatus::Degraded.to_string(), "degraded");
    }
}
