mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{data, TestServer};

#[tokio::test]
async fn public_listing_hides_inactive_properties() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    server.create_property(&owner, json!({ "name": "Pousada Ativa" })).await?;
    let inactive = server.create_property(&owner, json!({ "name": "Pousada Inativa" })).await?;
    let res = server
        .delete_as(&owner, &format!("/api/v1/properties/{}", inactive["id"].as_str().unwrap_or_default()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let page = data(server.get("/api/v1/public/properties").send().await?).await?;
    assert_eq!(page["count"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["results"][0]["slug"], "pousada-ativa");
    assert!(page["results"][0].get("owner_id").is_none());

    let res = server.get("/api/v1/public/properties/pousada-ativa").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.get("/api/v1/public/properties/pousada-inativa").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn search_ignores_accents_and_case() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    server
        .create_property(&owner, json!({ "name": "Café Véu da Noiva", "city": "Nova Friburgo", "state": "RJ" }))
        .await?;
    server
        .create_property(&owner, json!({ "name": "Pousada Maré Alta", "city": "Ubatuba", "state": "SP" }))
        .await?;

    for query in ["search=cafe", "search=CAF%C3%89", "search=friburgo", "city=nova%20friburgo", "state=rj"] {
        let page = data(server.get(&format!("/api/v1/public/properties?{}", query)).send().await?).await?;
        assert_eq!(page["count"], 1, "query {}", query);
        assert_eq!(page["results"][0]["slug"], "cafe-veu-da-noiva", "query {}", query);
    }

    let page = data(server.get("/api/v1/public/properties?page_size=1&page=2").send().await?).await?;
    assert_eq!(page["count"], 2);
    assert_eq!(page["page_size"], 1);
    assert_eq!(page["results"].as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn pousada_resolves_from_tenant_host_header() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;

    server
        .create_property(&owner, json!({ "name": "Pousada da Serra", "custom_domain": "pousadadaserra.com.br" }))
        .await?;

    let res = server
        .get("/api/v1/pousada")
        .header("X-Tenant-Host", "pousadadaserra.com.br:443")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(data(res).await?["name"], "Pousada da Serra");

    // 127.0.0.1 is reserved, so nothing resolves without a slug.
    let res = server.get("/api/v1/pousada").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/api/v1/pousada?slug=pousada-da-serra").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .get("/api/v1/pousada")
        .header("X-Tenant-Host", "desconhecido.com.br")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn dashboard_uses_resolved_property_within_scope() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.user("owner", false).await?;
    let stranger = server.user("stranger", false).await?;

    let property = server
        .create_property(&owner, json!({ "name": "Pousada Painel", "custom_domain": "painel.com.br" }))
        .await?;
    let id = property["id"].as_str().unwrap_or_default().to_string();

    let accommodation = data(
        server
            .post_as(&owner, "/api/v1/accommodations", &json!({ "property_id": id, "name": "Chalé", "base_price": 300 }))
            .send()
            .await?,
    )
    .await?;
    let guest = data(
        server
            .post_as(&owner, &format!("/api/v1/properties/{}/guests", id), &json!({ "name": "Maria Souza" }))
            .send()
            .await?,
    )
    .await?;
    let res = server
        .post_as(
            &owner,
            &format!("/api/v1/properties/{}/reservations", id),
            &json!({
                "accommodation_id": accommodation["id"],
                "guest_id": guest["id"],
                "check_in": "2026-12-20",
                "check_out": "2026-12-27",
                "adults": 2,
                "total_price": "2100.00"
            }),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .get_as(&owner, "/api/v1/dashboard/stats")
        .header("X-Tenant-Host", "painel.com.br")
        .send()
        .await?;
    let stats = data(res).await?;
    assert_eq!(stats["property_id"], id.as_str());
    assert_eq!(stats["accommodations_count"], 1);
    assert_eq!(stats["active_reservations"], 1);

    let res = server
        .get_as(&stranger, "/api/v1/dashboard/stats")
        .header("X-Tenant-Host", "painel.com.br")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
