//! # HTTP Flows
//!
//! Drives the gateway router built by the node runtime over a file-backed
//! store, including a restart between writing and reading.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use node_runtime::{NodeConfig, ServiceContainer, StorageBackend};
    use pas_06_api_gateway::{
        ApiGatewayService, HEADER_ACTOR_ID, HEADER_ACTOR_NAME, HEADER_ACTOR_ROLE,
    };
    use shared_store::ReadAccess;
    use shared_types::{Actor, Clock, ManualClock};

    use crate::fixtures::{admin, buyer, maker, shop};

    fn container(dir: &Path) -> ServiceContainer {
        let mut config = NodeConfig::default();
        config.storage.backend = StorageBackend::File;
        config.storage.data_dir = dir.to_path_buf();
        config.security.auth_secret = Some("5a".repeat(32));
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap(),
        ));
        ServiceContainer::with_clock(config, clock).unwrap()
    }

    fn router(container: &ServiceContainer) -> Router {
        ApiGatewayService::new(container.config.gateway.clone(), container.app_state())
            .unwrap()
            .router()
    }

    fn request(
        method: &str,
        uri: &str,
        actor: Option<&Actor>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder
                .header(HEADER_ACTOR_ID, actor.id.to_string())
                .header(HEADER_ACTOR_NAME, actor.name.as_str())
                .header(HEADER_ACTOR_ROLE, actor.role.as_str());
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_supply_chain_over_http_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let (serial, payload, item_ids, batch_id) = {
            let node = container(dir.path());
            let app = router(&node);

            let (status, product) = send(
                &app,
                request(
                    "POST",
                    "/manufacturer/products",
                    Some(&maker()),
                    Some(json!({"name": "Cold Brew", "category": "Beverages"})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, batch) = send(
                &app,
                request(
                    "POST",
                    "/manufacturer/production",
                    Some(&maker()),
                    Some(json!({
                        "product_def_id": product["product_def_id"],
                        "quantity": 3,
                        "location": "Plant 1",
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(batch["batch_number"], "BATCH-20260112-0001");
            let batch_id = batch["batch_id"].as_u64().unwrap();

            let (status, units) = send(
                &app,
                request(
                    "GET",
                    &format!("/manufacturer/batch/{}/units", batch_id),
                    Some(&maker()),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let item_ids: Vec<u64> = units
                .as_array()
                .unwrap()
                .iter()
                .map(|u| u["item_id"].as_u64().unwrap())
                .collect();
            assert_eq!(item_ids.len(), 3);

            let (status, shipment) = send(
                &app,
                request(
                    "POST",
                    "/manufacturer/shipments",
                    Some(&maker()),
                    Some(json!({
                        "item_ids": item_ids,
                        "retailer_id": shop().id,
                        "destination": "Corner Shop, High St",
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);

            let confirm = format!("/retailer/shipments/{}/confirm", shipment["shipment_id"]);
            let (status, _) = send(&app, request("POST", &confirm, Some(&shop()), None)).await;
            assert_eq!(status, StatusCode::OK);

            let (status, _) = send(
                &app,
                request(
                    "POST",
                    "/retailer/inventory/store",
                    Some(&shop()),
                    Some(json!({"item_ids": item_ids})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);

            let (status, sold) = send(
                &app,
                request(
                    "POST",
                    "/retailer/sales",
                    Some(&shop()),
                    Some(json!({"item_ids": [item_ids[0]], "location": "Till 1"})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(sold[0]["sequence"], 5);

            let unit = node.db.unit(item_ids[0]).unwrap().unwrap();
            let payload = format!("{}%23{}", unit.serial_code, unit.auth_hash);
            (unit.serial_code, payload, item_ids, batch_id)
        };

        // Restart on the same data directory.
        let node = container(dir.path());
        let app = router(&node);

        let (status, report) = send(
            &app,
            request("GET", &format!("/customer/verify/{}", payload), Some(&buyer(50)), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["verified"], true);
        assert_eq!(report["code"], serial.as_str());
        assert_eq!(report["blockchain_history"].as_array().unwrap().len(), 5);
        assert_eq!(report["unit"]["status"], "Sold");

        let (status, report) =
            send(&app, request("GET", "/verify/BATCH-20260112-0001", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["is_batch"], true);
        assert_eq!(report["status_counts"]["Sold"], 1);
        assert_eq!(report["status_counts"]["In_Inventory"], 2);

        let (status, audit) = send(
            &app,
            request(
                "GET",
                &format!("/manufacturer/ledger/batch/{}/verify", batch_id),
                Some(&maker()),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(audit["units_checked"], 3);
        assert_eq!(audit["broken_units"], 0);

        // The same units cannot be sold twice after the restart either.
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/retailer/sales",
                Some(&shop()),
                Some(json!({"item_ids": [item_ids[0]]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_forged_scan_reaches_admin_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let node = container(dir.path());
        let app = router(&node);

        let (_, product) = send(
            &app,
            request(
                "POST",
                "/manufacturer/products",
                Some(&maker()),
                Some(json!({"name": "Cold Brew"})),
            ),
        )
        .await;
        let (_, batch) = send(
            &app,
            request(
                "POST",
                "/manufacturer/production",
                Some(&maker()),
                Some(json!({"product_def_id": product["product_def_id"], "quantity": 1})),
            ),
        )
        .await;
        let serial = format!("{}-0001", batch["batch_number"].as_str().unwrap());

        let uri = format!("/verify/{}?hash={}", serial, "0".repeat(64));
        let (status, report) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["verified"], false);
        assert_eq!(report["scan_result"], "Fake");

        let (status, alerts) = send(
            &app,
            request("GET", "/admin/risk-alerts?resolved=false", Some(&admin()), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let alerts = alerts.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["kind"], "CounterfeitSuspected");

        let resolve = format!("/admin/risk-alerts/{}/resolve", alerts[0]["alert_id"]);
        let (status, resolved) = send(&app, request("POST", &resolve, Some(&admin()), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["resolved"], true);
    }
}
