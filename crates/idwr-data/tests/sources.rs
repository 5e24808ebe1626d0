use idwr_data::sources::{Lang, bullet_urls, probe_bullet_urls};
use idwr_fetch::mock::MockClient;
use idwr_fetch::{FetchOptions, Fetcher};

#[tokio::test]
async fn probe_keeps_absent_and_failed_apart() {
    let client = MockClient::new();
    let urls = bullet_urls(2024, Some(&[1, 2, 3, 4]), Lang::En).unwrap();
    client.serve(urls[0].clone(), "week,count\n1,3\n");
    client.serve(urls[1].clone(), "");
    client.respond_status(urls[2].clone(), 503);
    let fetcher = Fetcher::new(client.clone(), FetchOptions::default().max_retries(0));

    let availability = probe_bullet_urls(&fetcher, 2024, Some(&[1, 2, 3, 4]), Lang::En)
        .await
        .unwrap();

    assert_eq!(availability.available, vec![urls[0].clone()]);
    assert_eq!(availability.absent, vec![urls[1].clone(), urls[3].clone()]);
    assert_eq!(availability.failed.len(), 1);
    assert_eq!(availability.failed[0].0, urls[2]);
    assert_eq!(availability.failed[0].1.status(), Some(503));
    assert!(client.requests().iter().all(|r| r.method == "HEAD"));
}

#[tokio::test]
async fn probe_rejects_invalid_weeks_without_requests() {
    let client = MockClient::new();
    let fetcher = Fetcher::new(client.clone(), FetchOptions::default());

    let result = probe_bullet_urls(&fetcher, 2024, Some(&[0]), Lang::Ja).await;

    assert!(result.is_err());
    assert_eq!(client.request_count(), 0);
}
