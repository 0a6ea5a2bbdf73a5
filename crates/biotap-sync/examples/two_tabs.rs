//! Two tabs sharing one origin: a click in one tab invalidates the other

use biotap_sync::prelude::*;
use std::time::Duration;

fn sample() -> Vec<Link> {
    vec![Link {
        id: 42,
        title: "Portfolio".to_string(),
        url: "https://example.com".to_string(),
        description: None,
        is_active: true,
        display_order: 0,
        click_count: 5,
        created_at: "2024-01-01T00:00:00".to_string(),
        updated_at: None,
        user_id: 7,
        icon: None,
    }]
}

#[tokio::main]
async fn main() -> Result<()> {
    let origin = SharedStorage::with_defaults();

    // Each tab has its own cache and its own handle on the shared store
    let first_cache = QueryClient::new();
    let first_tab = CrossTabSync::new(origin.open_tab());

    let second_cache = QueryClient::new();
    let second_tab = CrossTabSync::new(origin.open_tab());

    for cache in [&first_cache, &second_cache] {
        cache.set_query_data(QueryKey::public_links("alice"), |_: Option<Vec<Link>>| {
            Some(sample())
        })?;
    }

    let _listener = second_tab.subscribe(&second_cache, vec![QueryKey::public_links("alice")]);

    // A click in the first tab updates its own cache and signals the second
    first_cache.set_queries_data(QueryKey::public_links("alice"), |mut links: Vec<Link>| {
        record_click(&mut links, 42);
        links
    });
    first_tab.trigger(SyncType::Click)?;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let entry = second_cache
        .get_query_entry::<Vec<Link>>(QueryKey::public_links("alice"))?
        .ok_or(SyncError::Internal("missing entry".to_string()))?;
    println!(
        "second tab: clicks={} stale={}",
        entry.value[0].click_count,
        entry.is_stale()
    );

    Ok(())
}
