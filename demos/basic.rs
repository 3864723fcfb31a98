use companycam_http::{CompanyCamClient, Page, PhotoFilter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let query = std::env::args().nth(1).unwrap_or_else(|| "Main St".to_owned());
    let client = CompanyCamClient::from_env()?;

    let projects = client.search_projects(&query, Page::default()).await?;
    let Some(projects) = projects.as_array() else {
        anyhow::bail!("unexpected project list shape: {projects}");
    };

    for project in projects {
        let id = project["id"].as_str().unwrap_or("?");
        println!("{} ({id})", project["name"].as_str().unwrap_or("Unnamed"));

        let photos = client
            .list_project_photos(id, &PhotoFilter::default(), Page::new(1, 5))
            .await?;
        for photo in photos.as_array().into_iter().flatten() {
            println!("  photo {}", photo["id"]);
        }
    }

    Ok(())
}
