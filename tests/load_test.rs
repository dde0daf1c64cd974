//! Load testing for the sink.

use std::time::Instant;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_performance() {
    let sink = common::start_sink(|_| {}).await;

    let concurrency = 20;
    let requests_per_task = 50;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task_id in 0..concurrency {
        let client = client.clone();
        let url = sink.url(&format!("/load/{task_id}"));
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                let res = client.get(&url).send().await.expect("sink unreachable");
                assert!(res.status().is_success());
                assert_eq!(res.text().await.unwrap(), "OK");
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    // Every answered request is counted exactly once, all under one host.
    let totals = sink.registry.snapshot_totals();
    assert_eq!(totals.requests, total_requests as u64);
    assert_eq!(sink.registry.snapshot_methods().get, total_requests as u64);
    assert_eq!(sink.registry.host_count(), 1);
    let hosts = sink.registry.snapshot_hosts();
    assert_eq!(hosts[0].1.requests, total_requests as u64);
    assert_eq!(hosts[0].1.bytes, totals.bytes);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    sink.stop().await.unwrap();
}
