mod common;

use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;

use common::{TestServer, WEBHOOK_SECRET};

async fn post_json(
    client: &reqwest::Client,
    url: String,
    token: &str,
    body: Value,
) -> (reqwest::StatusCode, Value) {
    let resp = client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("post");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(
    client: &reqwest::Client,
    url: String,
    token: &str,
) -> (reqwest::StatusCode, Value) {
    let resp = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .expect("get");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Creates a firm with an owner via the admin API and mints the owner a
/// token. Returns (firm_id, owner_id, owner_token).
async fn provision_firm(server: &TestServer, suffix: &str) -> (String, String, String) {
    let client = reqwest::Client::new();

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/admin/firms", server.base_url),
        &server.admin_token,
        json!({
            "name": format!("Firm {suffix}"),
            "company_email": format!("firm-{suffix}@example.test"),
            "owner": {
                "email": format!("owner-{suffix}@example.test"),
                "name": format!("Owner {suffix}")
            }
        }),
    )
    .await;
    assert_eq!(status, 201, "create firm: {resp}");

    let firm_id = resp["data"]["firm"]["id"].as_str().unwrap().to_string();
    let owner_id = resp["data"]["owner"]["id"].as_str().unwrap().to_string();
    let owner_token = mint_token(server, &owner_id).await;

    (firm_id, owner_id, owner_token)
}

async fn mint_token(server: &TestServer, user_id: &str) -> String {
    let client = reqwest::Client::new();
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/admin/users/{user_id}/tokens", server.base_url),
        &server.admin_token,
        json!({}),
    )
    .await;
    assert_eq!(status, 201, "mint token: {resp}");
    resp["data"]["token"].as_str().unwrap().to_string()
}

async fn create_sub_sidiary(server: &TestServer, token: &str, firm_id: &str, name: &str) -> String {
    let client = reqwest::Client::new();
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/sub-sidiaries", server.base_url),
        token,
        json!({
            "firm_id": firm_id,
            "name": name,
            "company_email": format!("{}@example.test", name.to_lowercase().replace(' ', "-"))
        }),
    )
    .await;
    assert_eq!(status, 201, "create subsidiary: {resp}");
    resp["data"]["id"].as_str().unwrap().to_string()
}

async fn create_stage(server: &TestServer, token: &str, sub_id: &str) -> String {
    let client = reqwest::Client::new();
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/stages", server.base_url),
        token,
        json!({ "sub_sidiary_id": sub_id, "name": "Sales" }),
    )
    .await;
    assert_eq!(status, 201, "create stage: {resp}");
    resp["data"]["id"].as_str().unwrap().to_string()
}

async fn create_lane(server: &TestServer, token: &str, stage_id: &str, name: &str) -> String {
    let client = reqwest::Client::new();
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/lanes", server.base_url),
        token,
        json!({ "stage_id": stage_id, "name": name }),
    )
    .await;
    assert_eq!(status, 201, "create lane: {resp}");
    resp["data"]["id"].as_str().unwrap().to_string()
}

async fn create_ticket(
    server: &TestServer,
    token: &str,
    lane_id: &str,
    name: &str,
    value: Option<&str>,
) -> String {
    let client = reqwest::Client::new();
    let mut body = json!({ "lane_id": lane_id, "name": name });
    if let Some(value) = value {
        body["value"] = json!(value);
    }
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/tickets", server.base_url),
        token,
        body,
    )
    .await;
    assert_eq!(status, 201, "create ticket: {resp}");
    resp["data"]["id"].as_str().unwrap().to_string()
}

fn sign_webhook(timestamp: i64, body: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(format!("{timestamp}.{body}").as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={digest}")
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let resp = reqwest::get(format!("{}/health", server.base_url))
        .await
        .expect("health");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_me_view_after_provisioning() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "me").await;

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/me", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");
    assert_eq!(resp["data"]["user"]["role"], "FIRM_OWNER");
    assert_eq!(resp["data"]["firm"]["id"], firm_id.as_str());
    // Default firm sidebar is seeded on creation.
    assert_eq!(resp["data"]["firm_sidebar"].as_array().unwrap().len(), 6);
    assert!(resp["data"]["sub_sidiaries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/v1/me", server.base_url))
        .send()
        .await
        .expect("get");
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/v1/admin/firms", server.base_url))
        .bearer_auth("firmhub_12345678_123456789012345678901234")
        .send()
        .await
        .expect("get");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_access_control_matrix() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "acl").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Branch One").await;

    // Invite a subsidiary-level member and accept on their behalf.
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/invitations", server.base_url),
        &owner_token,
        json!({ "email": "member-acl@example.test", "role": "SUBSIDIARY_USER" }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/admin/invitations/accept", server.base_url),
        &server.admin_token,
        json!({ "email": "member-acl@example.test", "name": "Member" }),
    )
    .await;
    assert_eq!(status, 200, "{resp}");
    assert_eq!(resp["data"]["firm_id"], firm_id.as_str());
    let member_id = resp["data"]["user"]["id"].as_str().unwrap().to_string();
    let member_token = mint_token(&server, &member_id).await;

    // Without a permission row the member is blocked and sees nothing.
    let (status, _) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries/{sub_id}", server.base_url),
        &member_token,
    )
    .await;
    assert_eq!(status, 403);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries", server.base_url),
        &member_token,
    )
    .await;
    assert!(resp["data"].as_array().unwrap().is_empty());

    // Member cannot grant themselves access.
    let resp = client
        .put(format!(
            "{}/api/v1/sub-sidiaries/{sub_id}/permissions",
            server.base_url
        ))
        .bearer_auth(&member_token)
        .json(&json!({ "email": "member-acl@example.test", "access": true }))
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 403);

    // Owner grants access; the subsidiary becomes visible.
    let resp = client
        .put(format!(
            "{}/api/v1/sub-sidiaries/{sub_id}/permissions",
            server.base_url
        ))
        .bearer_auth(&owner_token)
        .json(&json!({ "email": "member-acl@example.test", "access": true }))
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 200);

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries/{sub_id}", server.base_url),
        &member_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");

    // Revoking flips it back to blocked.
    let resp = client
        .put(format!(
            "{}/api/v1/sub-sidiaries/{sub_id}/permissions",
            server.base_url
        ))
        .bearer_auth(&owner_token)
        .json(&json!({ "email": "member-acl@example.test", "access": false }))
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 200);

    let (status, _) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries/{sub_id}", server.base_url),
        &member_token,
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_invitation_accept_is_idempotent() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "inv").await;

    let (status, _) = post_json(
        &client,
        format!("{}/api/v1/invitations", server.base_url),
        &owner_token,
        json!({ "email": "late@example.test" }),
    )
    .await;
    assert_eq!(status, 201);

    let accept = json!({ "email": "late@example.test", "name": "Late Joiner" });
    let (status, first) = post_json(
        &client,
        format!("{}/api/v1/admin/invitations/accept", server.base_url),
        &server.admin_token,
        accept.clone(),
    )
    .await;
    assert_eq!(status, 200);
    let user_id = first["data"]["user"]["id"].as_str().unwrap().to_string();
    assert_eq!(first["data"]["firm_id"], firm_id.as_str());

    // Second accept falls through to the email lookup: same user, no dup.
    let (status, second) = post_json(
        &client,
        format!("{}/api/v1/admin/invitations/accept", server.base_url),
        &server.admin_token,
        accept,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(second["data"]["user"]["id"], user_id.as_str());
    assert_eq!(second["data"]["firm_id"], firm_id.as_str());
}

#[tokio::test]
async fn test_team_member_update_and_removal() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "team").await;

    let (status, _) = post_json(
        &client,
        format!("{}/api/v1/invitations", server.base_url),
        &owner_token,
        json!({ "email": "teammate@example.test" }),
    )
    .await;
    assert_eq!(status, 201);

    let (_, resp) = post_json(
        &client,
        format!("{}/api/v1/admin/invitations/accept", server.base_url),
        &server.admin_token,
        json!({ "email": "teammate@example.test", "name": "Teammate" }),
    )
    .await;
    let member_id = resp["data"]["user"]["id"].as_str().unwrap().to_string();
    let member_token = mint_token(&server, &member_id).await;

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/firms/{firm_id}/team", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 2);

    // Promote the member to firm admin.
    let resp = client
        .patch(format!("{}/api/v1/users/{member_id}", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "role": "FIRM_ADMIN" }))
        .send()
        .await
        .expect("patch member");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["role"], "FIRM_ADMIN");

    // The owner role cannot be handed out.
    let resp = client
        .patch(format!("{}/api/v1/users/{member_id}", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "role": "FIRM_OWNER" }))
        .send()
        .await
        .expect("patch member");
    assert_eq!(resp.status(), 400);

    // Removal revokes the member's tokens along with the account.
    let resp = client
        .delete(format!("{}/api/v1/users/{member_id}", server.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .expect("delete member");
    assert_eq!(resp.status(), 204);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/firms/{firm_id}/team", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);

    let (status, _) = get_json(
        &client,
        format!("{}/api/v1/me", server.base_url),
        &member_token,
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_first_stage_is_seeded_on_first_visit() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "seed").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Fresh Co").await;

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries/{sub_id}/stages", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");
    let stages = resp["data"].as_array().unwrap();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0]["name"], "First Stage");

    // A second visit reuses the seeded stage rather than adding another.
    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/sub-sidiaries/{sub_id}/stages", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_board_ordering_and_value_summary() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "board").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Pipeline Co").await;
    let stage_id = create_stage(&server, &owner_token, &sub_id).await;

    let lane_open = create_lane(&server, &owner_token, &stage_id, "Open").await;
    let lane_won = create_lane(&server, &owner_token, &stage_id, "Won").await;

    create_ticket(&server, &owner_token, &lane_open, "Deal A", Some("100")).await;
    create_ticket(&server, &owner_token, &lane_open, "Deal B", Some("50")).await;
    create_ticket(&server, &owner_token, &lane_won, "Deal C", Some("30")).await;

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/stages/{stage_id}", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");

    let lanes = resp["data"]["lanes"].as_array().unwrap();
    assert_eq!(lanes.len(), 2);
    assert_eq!(lanes[0]["id"], lane_open.as_str());
    assert_eq!(lanes[0]["order"], 0);
    assert_eq!(lanes[1]["id"], lane_won.as_str());
    assert_eq!(lanes[1]["order"], 1);

    // Highest-order lane is the closing lane.
    assert_eq!(resp["data"]["summary"]["open_value"], 150.0);
    assert_eq!(resp["data"]["summary"]["closed_value"], 30.0);

    // Reorder lanes; the summary follows the new closing lane.
    let reorder = client
        .put(format!(
            "{}/api/v1/stages/{stage_id}/lanes/order",
            server.base_url
        ))
        .bearer_auth(&owner_token)
        .json(&json!({ "lane_ids": [lane_won, lane_open] }))
        .send()
        .await
        .expect("reorder");
    assert_eq!(reorder.status(), 204);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/stages/{stage_id}", server.base_url),
        &owner_token,
    )
    .await;
    let lanes = resp["data"]["lanes"].as_array().unwrap();
    assert_eq!(lanes[0]["id"], lane_won.as_str());
    assert_eq!(lanes[1]["id"], lane_open.as_str());
    assert_eq!(resp["data"]["summary"]["open_value"], 30.0);
    assert_eq!(resp["data"]["summary"]["closed_value"], 150.0);
}

#[tokio::test]
async fn test_cross_lane_ticket_move() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "move").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Mover Co").await;
    let stage_id = create_stage(&server, &owner_token, &sub_id).await;

    let lane_a = create_lane(&server, &owner_token, &stage_id, "A").await;
    let lane_b = create_lane(&server, &owner_token, &stage_id, "B").await;

    let a0 = create_ticket(&server, &owner_token, &lane_a, "a0", None).await;
    let a1 = create_ticket(&server, &owner_token, &lane_a, "a1", None).await;
    let a2 = create_ticket(&server, &owner_token, &lane_a, "a2", None).await;
    let b0 = create_ticket(&server, &owner_token, &lane_b, "b0", None).await;

    // Move a1 to lane B at position 0.
    let resp = client
        .put(format!("{}/api/v1/tickets/order", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "positions": [
            { "ticket_id": a0, "lane_id": lane_a, "order": 0 },
            { "ticket_id": a2, "lane_id": lane_a, "order": 1 },
            { "ticket_id": a1, "lane_id": lane_b, "order": 0 },
            { "ticket_id": b0, "lane_id": lane_b, "order": 1 }
        ] }))
        .send()
        .await
        .expect("reorder tickets");
    assert_eq!(resp.status(), 204);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/stages/{stage_id}", server.base_url),
        &owner_token,
    )
    .await;
    let lanes = resp["data"]["lanes"].as_array().unwrap();
    let names = |lane: &Value| -> Vec<String> {
        lane["tickets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names(&lanes[0]), vec!["a0", "a2"]);
    assert_eq!(names(&lanes[1]), vec!["a1", "b0"]);

    // A partial batch must not move anything.
    let resp = client
        .put(format!("{}/api/v1/tickets/order", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "positions": [
            { "ticket_id": a0, "lane_id": lane_b, "order": 0 }
        ] }))
        .send()
        .await
        .expect("reorder tickets");
    assert_eq!(resp.status(), 409);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/stages/{stage_id}", server.base_url),
        &owner_token,
    )
    .await;
    let lanes = resp["data"]["lanes"].as_array().unwrap();
    assert_eq!(names(&lanes[0]), vec!["a0", "a2"]);
}

#[tokio::test]
async fn test_sub_sidiary_cascade_delete() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "cascade").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Doomed Co").await;
    let stage_id = create_stage(&server, &owner_token, &sub_id).await;
    let lane_id = create_lane(&server, &owner_token, &stage_id, "Lane").await;
    let ticket_id = create_ticket(&server, &owner_token, &lane_id, "Deal", None).await;

    let resp = client
        .delete(format!("{}/api/v1/sub-sidiaries/{sub_id}", server.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), 204);

    for url in [
        format!("{}/api/v1/sub-sidiaries/{sub_id}", server.base_url),
        format!("{}/api/v1/stages/{stage_id}", server.base_url),
        format!("{}/api/v1/tickets/{ticket_id}", server.base_url),
    ] {
        let (status, _) = get_json(&client, url, &owner_token).await;
        assert_eq!(status, 404);
    }

    // The deletion itself lands in the firm's activity feed, after the
    // cascade has gone through.
    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/firms/{firm_id}/notifications", server.base_url),
        &owner_token,
    )
    .await;
    let text = resp["data"][0]["notification"].as_str().unwrap();
    assert!(
        text.contains(" | Deleted a subsidiary | Doomed Co"),
        "unexpected entry: {text}"
    );
}

#[tokio::test]
async fn test_ticket_relations_are_tenant_scoped() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_a, _, owner_a) = provision_firm(&server, "tenant-a").await;
    let (firm_b, owner_b_id, owner_b) = provision_firm(&server, "tenant-b").await;

    let sub_a = create_sub_sidiary(&server, &owner_a, &firm_a, "Alpha Co").await;
    let stage_a = create_stage(&server, &owner_a, &sub_a).await;
    let lane_a = create_lane(&server, &owner_a, &stage_a, "Lane").await;

    let sub_b = create_sub_sidiary(&server, &owner_b, &firm_b, "Bravo Co").await;
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/tags", server.base_url),
        &owner_b,
        json!({ "sub_sidiary_id": sub_b, "name": "Secret", "color": "#f00" }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let foreign_tag = resp["data"]["id"].as_str().unwrap().to_string();

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/contacts", server.base_url),
        &owner_b,
        json!({ "sub_sidiary_id": sub_b, "name": "Buyer", "email": "buyer@bravo.test" }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let foreign_contact = resp["data"]["id"].as_str().unwrap().to_string();

    // Creating a ticket in firm A must not accept firm B's rows.
    for body in [
        json!({ "lane_id": lane_a, "name": "Deal", "tag_ids": [foreign_tag] }),
        json!({ "lane_id": lane_a, "name": "Deal", "customer_id": foreign_contact }),
        json!({ "lane_id": lane_a, "name": "Deal", "assigned_user_id": owner_b_id }),
    ] {
        let (status, resp) = post_json(
            &client,
            format!("{}/api/v1/tickets", server.base_url),
            &owner_a,
            body,
        )
        .await;
        assert_eq!(status, 400, "{resp}");
    }

    // Same for smuggling them in through an update.
    let ticket_id = create_ticket(&server, &owner_a, &lane_a, "Deal", None).await;
    let resp = client
        .patch(format!("{}/api/v1/tickets/{ticket_id}", server.base_url))
        .bearer_auth(&owner_a)
        .json(&json!({ "tag_ids": [foreign_tag] }))
        .send()
        .await
        .expect("patch ticket");
    assert_eq!(resp.status(), 400);

    let (_, resp) = get_json(
        &client,
        format!("{}/api/v1/tickets/{ticket_id}", server.base_url),
        &owner_a,
    )
    .await;
    assert_eq!(resp["data"]["tags"].as_array().unwrap().len(), 0);

    // A tag from the ticket's own subsidiary still attaches fine.
    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/tags", server.base_url),
        &owner_a,
        json!({ "sub_sidiary_id": sub_a, "name": "Hot", "color": "#0f0" }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let own_tag = resp["data"]["id"].as_str().unwrap().to_string();

    let resp = client
        .patch(format!("{}/api/v1/tickets/{ticket_id}", server.base_url))
        .bearer_auth(&owner_a)
        .json(&json!({ "tag_ids": [own_tag] }))
        .send()
        .await
        .expect("patch ticket");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["tags"][0]["name"], "Hot");
}

#[tokio::test]
async fn test_activity_feed_records_mutations() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "feed").await;
    create_sub_sidiary(&server, &owner_token, &firm_id, "Feed Co").await;

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/firms/{firm_id}/notifications", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");
    let entries = resp["data"].as_array().unwrap();
    assert!(!entries.is_empty());
    let text = entries[0]["notification"].as_str().unwrap();
    assert!(
        text.contains(" | Created a subsidiary | Feed Co"),
        "unexpected entry: {text}"
    );
}

#[tokio::test]
async fn test_public_site_and_visit_counter() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "site").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Site Co").await;

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/campaigns", server.base_url),
        &owner_token,
        json!({
            "sub_sidiary_id": sub_id,
            "name": "Launch",
            "sub_domain_name": "launch",
            "published": true
        }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let campaign_id = resp["data"]["id"].as_str().unwrap().to_string();

    // First page gets the root path by default.
    let (status, _) = post_json(
        &client,
        format!("{}/api/v1/campaigns/{campaign_id}/pages", server.base_url),
        &owner_token,
        json!({ "name": "Home" }),
    )
    .await;
    assert_eq!(status, 201);

    // Second page without a path is rejected.
    let (status, _) = post_json(
        &client,
        format!("{}/api/v1/campaigns/{campaign_id}/pages", server.base_url),
        &owner_token,
        json!({ "name": "Pricing" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = post_json(
        &client,
        format!("{}/api/v1/campaigns/{campaign_id}/pages", server.base_url),
        &owner_token,
        json!({ "name": "Pricing", "path_name": "pricing" }),
    )
    .await;
    assert_eq!(status, 201);

    // Public resolution needs no token; each hit counts one visit.
    let resp = reqwest::get(format!("{}/sites/launch", server.base_url))
        .await
        .expect("site");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["page"]["name"], "Home");
    assert_eq!(body["data"]["page"]["visits"], 1);

    let resp = reqwest::get(format!("{}/sites/launch/pricing", server.base_url))
        .await
        .expect("site page");
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["page"]["name"], "Pricing");
    assert_eq!(body["data"]["page"]["visits"], 1);

    let resp = reqwest::get(format!("{}/sites/launch", server.base_url))
        .await
        .expect("site again");
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["page"]["visits"], 2);

    // Unknown domains stay invisible.
    let resp = reqwest::get(format!("{}/sites/nope", server.base_url))
        .await
        .expect("missing site");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_root_page_keeps_the_empty_path() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "root").await;
    let sub_id = create_sub_sidiary(&server, &owner_token, &firm_id, "Root Co").await;

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/campaigns", server.base_url),
        &owner_token,
        json!({
            "sub_sidiary_id": sub_id,
            "name": "Landing",
            "sub_domain_name": "landing",
            "published": true
        }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let campaign_id = resp["data"]["id"].as_str().unwrap().to_string();

    let (status, resp) = post_json(
        &client,
        format!("{}/api/v1/campaigns/{campaign_id}/pages", server.base_url),
        &owner_token,
        json!({ "name": "Home" }),
    )
    .await;
    assert_eq!(status, 201, "{resp}");
    let page_id = resp["data"]["id"].as_str().unwrap().to_string();

    // Moving the root page to a path would leave the bare subdomain
    // resolving to nothing.
    let resp = client
        .patch(format!("{}/api/v1/pages/{page_id}", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "path_name": "home" }))
        .send()
        .await
        .expect("patch page");
    assert_eq!(resp.status(), 400);

    // Renaming in place is still fine.
    let resp = client
        .patch(format!("{}/api/v1/pages/{page_id}", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "name": "Welcome" }))
        .send()
        .await
        .expect("patch page");
    assert_eq!(resp.status(), 200);

    let resp = reqwest::get(format!("{}/sites/landing", server.base_url))
        .await
        .expect("site");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["data"]["page"]["name"], "Welcome");
}

#[tokio::test]
async fn test_billing_webhook_projection() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (firm_id, _, owner_token) = provision_firm(&server, "billing").await;

    // Attach the billing customer to the firm.
    let resp = client
        .patch(format!("{}/api/v1/firms/{firm_id}", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "customer_id": "cus_hook" }))
        .send()
        .await
        .expect("patch firm");
    assert_eq!(resp.status(), 200);

    let event = json!({
        "id": "evt_test",
        "type": "customer.subscription.created",
        "data": { "object": {
            "id": "sub_hook",
            "customer": "cus_hook",
            "status": "active",
            "current_period_end": 1900000000i64,
            "plan": { "id": "price_pro" }
        } }
    })
    .to_string();

    // Missing and bad signatures are rejected.
    let resp = client
        .post(format!("{}/api/v1/billing/webhook", server.base_url))
        .body(event.clone())
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{}/api/v1/billing/webhook", server.base_url))
        .header("x-billing-signature", "t=1,v1=deadbeef")
        .body(event.clone())
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 401);

    let signature = sign_webhook(chrono::Utc::now().timestamp(), &event);
    let resp = client
        .post(format!("{}/api/v1/billing/webhook", server.base_url))
        .header("x-billing-signature", signature)
        .body(event)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 200);

    let (status, resp) = get_json(
        &client,
        format!("{}/api/v1/firms/{firm_id}/subscription", server.base_url),
        &owner_token,
    )
    .await;
    assert_eq!(status, 200, "{resp}");
    assert_eq!(resp["data"]["active"], true);
    assert_eq!(resp["data"]["price_id"], "price_pro");
}
