//! Benchmarks for the optimistic update path

use biotap_sync::{LINKS, Link, QueryClient, QueryKey, record_click};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn links(count: i64) -> Vec<Link> {
    (0..count)
        .map(|id| Link {
            id,
            title: format!("link {}", id),
            url: format!("https://example.com/{}", id),
            description: None,
            is_active: true,
            display_order: id as i32,
            click_count: 0,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: None,
            user_id: 1,
            icon: None,
        })
        .collect()
}

fn create_client(users: i64, per_user: i64) -> QueryClient {
    let client = QueryClient::new();
    for user in 0..users {
        client
            .set_query_data(QueryKey::links(user), |_: Option<Vec<Link>>| {
                Some(links(per_user))
            })
            .unwrap();
    }
    client
}

fn bench_read(c: &mut Criterion) {
    let client = create_client(1, 20);

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        b.iter(|| {
            let links: Option<Vec<Link>> =
                client.get_query_data(black_box(QueryKey::links(0))).unwrap();
            black_box(links);
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            let links: Option<Vec<Link>> =
                client.get_query_data(black_box(QueryKey::links(99))).unwrap();
            black_box(links);
        });
    });

    group.finish();
}

fn bench_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimistic_click");

    for (users, per_user) in [(1, 20), (10, 20), (1, 200)] {
        let client = create_client(users, per_user);
        group.throughput(Throughput::Elements(users as u64));

        group.bench_function(format!("{}x{}", users, per_user), |b| {
            b.iter(|| {
                let updated = client.set_queries_data(QueryKey::root(LINKS), |mut links: Vec<Link>| {
                    record_click(&mut links, black_box(per_user / 2));
                    links
                });
                black_box(updated);
            });
        });
    }

    group.finish();
}

fn bench_invalidate(c: &mut Criterion) {
    let client = create_client(100, 5);

    let mut group = c.benchmark_group("invalidate");
    group.throughput(Throughput::Elements(100));

    group.bench_function("prefix_100", |b| {
        b.iter(|| black_box(client.invalidate(QueryKey::root(LINKS))));
    });

    group.finish();
}

criterion_group!(benches, bench_read, bench_click, bench_invalidate);
criterion_main!(benches);
