use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use ucera_maintenance::models::{UserProfile, UserRecord};
use ucera_maintenance::sweep::is_delete_candidate;

fn benchmark_partition(c: &mut Criterion) {
    let now = Utc::now();
    let grace = std::time::Duration::from_secs(180);

    // A mix of complete, incomplete, young and old registrations
    let users: Vec<UserRecord> = (0..10_000)
        .map(|i| UserRecord {
            id: format!("user-{}", i),
            created_at: now - Duration::seconds(i as i64 % 600),
            profile: UserProfile {
                full_name: Some(format!("User {}", i)),
                public_photo: (i % 3 != 0).then(|| "https://cdn.example/p.jpg".to_string()),
                has_member_card: Some(i % 2 == 0),
                ..Default::default()
            },
        })
        .collect();

    let mut group = c.benchmark_group("retention_policy");

    group.bench_function("partition_10k_users", |b| {
        b.iter(|| {
            black_box(&users)
                .iter()
                .filter(|user| is_delete_candidate(user, now, grace))
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_partition);
criterion_main!(benches);
