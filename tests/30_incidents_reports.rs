mod common;

use anyhow::Result;
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn incident_creation_is_role_and_owner_gated() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let commander = common::register(server, "commander").await?;
    let pilot = common::register(server, "pilot").await?;
    let user = common::register(server, "user").await?;

    let mission = common::create_mission(server, &commander, &common::unique("Gated"), "pending").await?;
    let mission_id = id_of(&mission);
    let url = server.url(&format!("/api/missions/{}/incidents", mission_id));
    let body = json!({"title": "Hull breach", "description": "Deck 3", "status": "pending"});

    let res = client.post(&url).bearer_auth(&user.token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "User role user is not authorized to access this route"
    );

    let res = client.post(&url).bearer_auth(&pilot.token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.json::<Value>().await?["message"],
        format!(
            "User {} does not have permission to create an incident for mission {}.",
            pilot.id, mission_id
        )
    );

    let res = client.post(&url).bearer_auth(&commander.token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let incident = res.json::<Value>().await?;
    assert_eq!(incident["mission_id"], mission_id.as_str());
    assert_eq!(incident["status"], "pending");
    Ok(())
}

#[tokio::test]
async fn incidents_list_is_scoped_to_the_mission() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pilot = common::register(server, "pilot").await?;

    let first = common::create_mission(server, &pilot, &common::unique("First"), "pending").await?;
    let second = common::create_mission(server, &pilot, &common::unique("Second"), "pending").await?;
    common::create_incident(server, &pilot, &id_of(&first)).await?;
    common::create_incident(server, &pilot, &id_of(&first)).await?;
    common::create_incident(server, &pilot, &id_of(&second)).await?;

    let body = Client::new()
        .get(server.url(&format!("/api/missions/{}/incidents", id_of(&first))))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let incidents = body.as_array().cloned().unwrap_or_default();
    assert_eq!(incidents.len(), 2);
    assert!(incidents.iter().all(|i| i["mission_id"] == first["id"]));
    Ok(())
}

#[tokio::test]
async fn incident_update_and_delete() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let pilot = common::register(server, "pilot").await?;
    let mission = common::create_mission(server, &pilot, &common::unique("Updates"), "pending").await?;
    let incident = common::create_incident(server, &pilot, &id_of(&mission)).await?;
    let url = server.url(&format!("/api/incidents/{}", id_of(&incident)));

    let res = client
        .put(&url)
        .bearer_auth(&pilot.token)
        .json(&json!({"status": "resolved"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["status"], "resolved");

    let res = client
        .put(&url)
        .bearer_auth(&pilot.token)
        .json(&json!({"status": "lost"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.delete(&url).bearer_auth(&pilot.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"message": "Incident deleted successfully"}));

    let res = client.get(&url).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "Incident not found");
    Ok(())
}

#[tokio::test]
async fn report_must_belong_to_the_mission_in_the_path() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pilot = common::register(server, "pilot").await?;
    let first = common::create_mission(server, &pilot, &common::unique("Left"), "pending").await?;
    let second = common::create_mission(server, &pilot, &common::unique("Right"), "pending").await?;
    let incident = common::create_incident(server, &pilot, &id_of(&second)).await?;

    let res = Client::new()
        .post(server.url(&format!(
            "/api/missions/{}/incidents/{}/reports",
            id_of(&first),
            id_of(&incident)
        )))
        .bearer_auth(&pilot.token)
        .json(&json!({"title": "Mismatch", "content": "x"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "Incident not found");
    Ok(())
}

#[tokio::test]
async fn report_lifecycle_with_files() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let pilot = common::register(server, "pilot").await?;
    let mission = common::create_mission(server, &pilot, &common::unique("Files"), "pending").await?;
    let mission_id = id_of(&mission);
    let incident = common::create_incident(server, &pilot, &mission_id).await?;
    let incident_id = id_of(&incident);
    let report = common::create_report(server, &pilot, &mission_id, &incident_id).await?;
    assert_eq!(report["status"], "open");
    assert_eq!(report["files"], json!([]));

    let base = server.url(&format!(
        "/api/missions/{}/incidents/{}/reports",
        mission_id, incident_id
    ));
    let report_url = format!("{}/{}", base, id_of(&report));

    let listed = client.get(&base).send().await?.json::<Value>().await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    // upload without a file part
    let form = multipart::Form::new().text("note", "no file here");
    let res = client
        .post(format!("{}/upload", report_url))
        .bearer_auth(&pilot.token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "Please upload a file");

    let part = multipart::Part::bytes(b"telemetry dump".to_vec())
        .file_name("telemetry.txt")
        .mime_str("text/plain")?;
    let res = client
        .post(format!("{}/upload", report_url))
        .bearer_auth(&pilot.token)
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let uploaded = res.json::<Value>().await?;
    assert_eq!(uploaded["message"], "File uploaded and added to report successfully");
    assert_eq!(uploaded["file"]["file_type"], "text/plain");
    let file_id = id_of(&uploaded["file"]);
    let file_url = uploaded["file_url"].as_str().unwrap_or_default().to_string();

    let blob = client.get(&file_url).send().await?;
    assert_eq!(blob.status(), StatusCode::OK);
    assert_eq!(blob.text().await?, "telemetry dump");

    let files = client
        .get(format!("{}/files", report_url))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(files["files"].as_array().map(Vec::len), Some(1));

    let file = client
        .get(format!("{}/files/{}", report_url, file_id))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(file["file_url"], file_url.as_str());

    let res = client
        .delete(format!("{}/files/{}", report_url, file_id))
        .bearer_auth(&pilot.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"message": "File deleted successfully"}));

    let res = client.get(format!("{}/files/{}", report_url, file_id)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "File not found");

    let res = client
        .put(&report_url)
        .bearer_auth(&pilot.token)
        .json(&json!({"status": "closed"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["status"], "closed");

    let res = client.delete(&report_url).bearer_auth(&pilot.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"message": "Report deleted successfully"}));
    Ok(())
}

async fn upload(client: &Client, account: &common::Account, report_url: &str, name: &str) -> Result<Value> {
    let part = multipart::Part::bytes(name.as_bytes().to_vec())
        .file_name(name.to_string())
        .mime_str("text/plain")?;
    let res = client
        .post(format!("{}/upload", report_url))
        .bearer_auth(&account.token)
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "upload failed: {}", res.status());
    Ok(res.json::<Value>().await?["file"].clone())
}

#[tokio::test]
async fn deleting_one_file_keeps_the_others() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let pilot = common::register(server, "pilot").await?;
    let mission = common::create_mission(server, &pilot, &common::unique("Attachments"), "pending").await?;
    let mission_id = id_of(&mission);
    let incident = common::create_incident(server, &pilot, &mission_id).await?;
    let incident_id = id_of(&incident);
    let report = common::create_report(server, &pilot, &mission_id, &incident_id).await?;
    let report_url = server.url(&format!(
        "/api/missions/{}/incidents/{}/reports/{}",
        mission_id,
        incident_id,
        id_of(&report)
    ));

    let first = upload(&client, &pilot, &report_url, "first.txt").await?;
    let second = upload(&client, &pilot, &report_url, "second.txt").await?;
    let third = upload(&client, &pilot, &report_url, "third.txt").await?;

    let res = client
        .delete(format!("{}/files/{}", report_url, id_of(&second)))
        .bearer_auth(&pilot.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let files = client
        .get(format!("{}/files", report_url))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let ids: Vec<String> = files["files"]
        .as_array()
        .map(|files| files.iter().map(id_of).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![id_of(&first), id_of(&third)]);

    // deleting the last remaining files leaves an empty list, not null
    for file in [&first, &third] {
        client
            .delete(format!("{}/files/{}", report_url, id_of(file)))
            .bearer_auth(&pilot.token)
            .send()
            .await?;
    }
    let files = client
        .get(format!("{}/files", report_url))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(files["files"], json!([]));
    Ok(())
}
