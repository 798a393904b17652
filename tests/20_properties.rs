mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use hyfen_api::database::models::{AuditAction, AuditEntity};
use hyfen_api::database::AuditStore;

use common::{data, TestServer};

#[tokio::test]
async fn duplicate_names_get_suffixed_slugs() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ana = server.user("ana", false).await?;
    let bia = server.user("bia", false).await?;

    let first = server.create_property(&ana, json!({ "name": "Pousada Mar Azul" })).await?;
    let second = server.create_property(&bia, json!({ "name": "Pousada Mar Azul" })).await?;
    let third = server.create_property(&ana, json!({ "name": "Pousada  Mar   Azul" })).await?;

    assert_eq!(first["slug"], "pousada-mar-azul");
    assert_eq!(second["slug"], "pousada-mar-azul-1");
    assert_eq!(third["slug"], "pousada-mar-azul-2");

    // The creator is recorded as OWNER.
    let id = first["id"].as_str().unwrap_or_default();
    let res = server.get_as(&ana, &format!("/api/v1/properties/{}/access", id)).send().await?;
    let grants = data(res).await?;
    assert_eq!(grants.as_array().map(Vec::len), Some(1));
    assert_eq!(grants[0]["role"], "OWNER");

    Ok(())
}

#[tokio::test]
async fn strangers_see_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;
    let stranger = server.user("stranger", false).await?;

    let property = server.create_property(&owner, json!({ "name": "Pousada Recanto" })).await?;
    let path = format!("/api/v1/properties/{}", property["id"].as_str().unwrap_or_default());

    let res = server.get_as(&stranger, &path).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.patch_as(&stranger, &path, &json!({ "name": "Hijacked" })).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get_as(&stranger, "/api/v1/properties").send().await?;
    let page = data(res).await?;
    assert_eq!(page["count"], 0);

    let res = server.get_as(&owner, &path).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(data(res).await?["accommodations_count"], 0);

    Ok(())
}

#[tokio::test]
async fn custom_domain_is_unique() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    let a = server
        .create_property(&owner, json!({ "name": "Pousada A", "custom_domain": "Pousada-A.com.br" }))
        .await?;
    assert_eq!(a["custom_domain"], "pousada-a.com.br");

    let res = server
        .post_as(&owner, "/api/v1/properties", &json!({ "name": "Pousada B", "custom_domain": "pousada-a.com.br" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["custom_domain"].is_string());

    Ok(())
}

#[tokio::test]
async fn soft_delete_cascades_to_accommodations() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    let property = server.create_property(&owner, json!({ "name": "Pousada Cascata" })).await?;
    let property_id = property["id"].as_str().unwrap_or_default().to_string();

    let res = server
        .post_as(
            &owner,
            "/api/v1/accommodations",
            &json!({ "property_id": property_id, "name": "Suíte Master", "base_price": "420.00" }),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let accommodation = data(res).await?;
    let accommodation_path = format!("/api/v1/accommodations/{}", accommodation["id"].as_str().unwrap_or_default());

    let res = server
        .delete_as(&owner, &format!("/api/v1/properties/{}", property_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get_as(&owner, &accommodation_path).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/api/v1/public/properties/pousada-cascata").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The deletion leaves a trail for the property and the cascaded row.
    let trail = server.store.list_audit(AuditEntity::Property, property_id.parse::<Uuid>()?).await?;
    let deleted = trail.last().context("no audit entry for the property")?;
    assert_eq!(deleted.action, AuditAction::Delete);
    assert_eq!(deleted.actor_id, Some(owner.id));
    assert_eq!(deleted.changes["is_active"], json!([true, false]));

    let accommodation_id = accommodation["id"].as_str().unwrap_or_default().parse::<Uuid>()?;
    let trail = server.store.list_audit(AuditEntity::Accommodation, accommodation_id).await?;
    assert_eq!(trail.iter().map(|e| e.action).collect::<Vec<_>>(), vec![AuditAction::Create, AuditAction::Delete]);

    Ok(())
}

#[tokio::test]
async fn managers_can_edit_but_not_share() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;
    let manager = server.user("manager", false).await?;
    let other = server.user("other", false).await?;

    let property = server.create_property(&owner, json!({ "name": "Pousada Equipe" })).await?;
    let id = property["id"].as_str().unwrap_or_default().to_string();
    let access = format!("/api/v1/properties/{}/access", id);

    let res = server
        .post_as(&owner, &access, &json!({ "user_id": manager.id, "role": "MANAGER" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .patch_as(&manager, &format!("/api/v1/properties/{}", id), &json!({ "city": "Paraty" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(data(res).await?["city"], "Paraty");

    let res = server
        .post_as(&manager, &access, &json!({ "user_id": other.id, "role": "MANAGER" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .delete_as(&owner, &format!("{}/{}", access, manager.id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get_as(&manager, &format!("/api/v1/properties/{}", id)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn owners_read_the_change_history() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;
    let manager = server.user("manager", false).await?;

    let property = server.create_property(&owner, json!({ "name": "Pousada Histórica" })).await?;
    let id = property["id"].as_str().unwrap_or_default().to_string();
    let res = server
        .post_as(&owner, &format!("/api/v1/properties/{}/access", id), &json!({ "user_id": manager.id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .patch_as(&manager, &format!("/api/v1/properties/{}", id), &json!({ "city": "Tiradentes" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let history_path = format!("/api/v1/properties/{}/history", id);
    let res = server.get_as(&owner, &history_path).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let history = data(res).await?;
    assert_eq!(history.as_array().map(Vec::len), Some(2));
    assert_eq!(history[0]["action"], "create");
    assert_eq!(history[1]["action"], "update");
    assert_eq!(history[1]["actor_id"], json!(manager.id));
    assert_eq!(history[1]["changes"]["city"], json!(["", "Tiradentes"]));

    let res = server.get_as(&manager, &history_path).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn malformed_input_gets_a_bad_request_envelope() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    let res = server.get_as(&owner, "/api/v1/properties/not-a-uuid").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "BAD_REQUEST");

    let res = server
        .client
        .post(server.url("/api/v1/properties"))
        .bearer_auth(&owner.token)
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "BAD_REQUEST");

    let res = server.get_as(&owner, "/api/v1/properties?page=first").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "BAD_REQUEST");

    Ok(())
}
