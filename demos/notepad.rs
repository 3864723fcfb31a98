use std::time::Duration;

use companycam_http::{ApiRequest, CompanyCamClient};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(project_id), Some(line)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: notepad <project-id> <line to append>");
    };

    let client = CompanyCamClient::from_env()?;

    // PUT replaces the notepad, so read it first and send the whole text back.
    let project = client
        .send(ApiRequest::get(format!("projects/{project_id}")).timeout(Duration::from_secs(20)))
        .await?;
    let current = project["notepad"].as_str().unwrap_or_default();
    let updated = if current.is_empty() {
        line
    } else {
        format!("{current}\n{line}")
    };

    client.update_project_notepad(&project_id, &updated).await?;
    client
        .add_project_comment(&project_id, &format!("Notepad updated ({} chars)", updated.len()))
        .await?;

    println!("{}", json!({ "project_id": project_id, "notepad": updated }));
    Ok(())
}
