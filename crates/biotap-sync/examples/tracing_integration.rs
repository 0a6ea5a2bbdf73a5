use biotap_sync::prelude::*;
use biotap_sync::{JsonSerializer, MemoryQueryStore, TracingMetrics};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing subscriber
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // 2. Create a QueryClient reporting through TracingMetrics
    let metrics = TracingMetrics::new().with_service_name("example-service");
    let client = QueryClient::with_store(
        MemoryQueryStore::new(),
        JsonSerializer,
        metrics,
        QueryClientConfig::default(),
    );

    // 3. Mount a query; the first fetch happens in the background
    let _observer = client.observe(QueryKey::links(7), QueryOpts::new().stale_secs(30), || async {
        Ok(vec![Link {
            id: 42,
            title: "Blog".to_string(),
            url: "https://example.com".to_string(),
            description: None,
            is_active: true,
            display_order: 0,
            click_count: 5,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: None,
            user_id: 7,
            icon: None,
        }])
    });
    client.fetch(QueryKey::links(7)).await?;

    println!("\nRecording a click...");
    client.set_queries_data(QueryKey::root(LINKS), |mut links: Vec<Link>| {
        record_click(&mut links, 42);
        links
    });

    println!("\nInvalidating...");
    client.invalidate(QueryKey::root(LINKS));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    println!("\nStats: {:?}", client.stats());
    Ok(())
}
