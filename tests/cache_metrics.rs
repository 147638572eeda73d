mod support;

use std::collections::HashMap;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;

use blogo::application::blogs::CreateBlogCommand;
use blogo::infra::telemetry;

use support::Harness;

#[tokio::test]
#[serial]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let harness = Harness::cached();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;

    // registration populated the cache; the follow drops both snapshots
    harness.users.get_by_id(alice.id).await.expect("hit");
    harness.users.follow(alice.id, bob.id).await.expect("follow");
    harness.users.get_by_id(alice.id).await.expect("miss");

    let blog = harness
        .blogs
        .create(CreateBlogCommand {
            title: "Counted".into(),
            description: String::new(),
            body: "body".into(),
            author_id: alice.id,
        })
        .await
        .expect("create");
    harness.blogs.get_by_id(blog.id).await.expect("blog miss");
    harness.blogs.get_by_id(blog.id).await.expect("blog hit");

    let mut counters: HashMap<(String, String), u64> = HashMap::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = composite_key.key();
        let kind = key
            .labels()
            .find(|label| label.key() == "kind")
            .map(|label| label.value().to_string())
            .unwrap_or_default();
        if let DebugValue::Counter(count) = value {
            counters.insert((key.name().to_string(), kind), count);
        }
    }

    let get = |name: &str, kind: &str| {
        counters
            .get(&(name.to_string(), kind.to_string()))
            .copied()
            .unwrap_or(0)
    };

    assert!(get("blogo_cache_hit_total", "user") >= 1);
    assert!(get("blogo_cache_miss_total", "user") >= 1);
    assert!(get("blogo_cache_invalidate_total", "user") >= 2);
    assert_eq!(get("blogo_cache_miss_total", "blog"), 1);
    assert_eq!(get("blogo_cache_hit_total", "blog"), 1);
    assert!(get("blogo_cache_invalidate_total", "blog_list") >= 1);
    assert_eq!(get("blogo_cache_error_total", "user"), 0);
}
