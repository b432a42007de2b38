//! Integration tests for cancellation during retries, rate limiting and transport calls

use psref::client::{ClientConfig, RateLimit};
use psref::{Cancellation, Client, ClientError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::support::mock_transport::{client, ok_json, status, MockTransport, BASE_URL};

#[tokio::test]
async fn test_unbounded_retries_stop_on_cancellation() {
    let cancel = Cancellation::shared();
    let transport = {
        let cancel = cancel.clone();
        MockTransport::new(move |_, call| {
            if call == 5 {
                cancel.cancel();
            }
            status(500)
        })
    };

    let err = client(&transport, -1).updates(&cancel).await.unwrap_err();

    assert_eq!(err, ClientError::Cancelled);
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn test_already_cancelled_makes_no_calls() {
    let transport = MockTransport::new(|_, _| ok_json(json!([])));
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = client(&transport, 3).products(&cancel).await.unwrap_err();

    assert_eq!(err, ClientError::Cancelled);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_rate_limiter_wait() {
    let transport = MockTransport::new(|_, _| ok_json(json!([])));
    let c = Client::with_config(
        ClientConfig::builder()
            .base_url(BASE_URL)
            .transport(transport.clone())
            .rate_limit(RateLimit::PerInterval {
                interval: Duration::from_secs(60),
                burst: 1,
            })
            .build(),
    );

    c.books(&Cancellation::new()).await.unwrap();

    let started = tokio::time::Instant::now();
    let deadline = Cancellation::with_deadline(Duration::from_secs(1));
    let err = c.books(&deadline).await.unwrap_err();

    assert_eq!(err, ClientError::Cancelled);
    assert_eq!(transport.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_transport_call() {
    let transport = MockTransport::delayed(Duration::from_secs(300), |_, _| ok_json(json!([])));
    let deadline = Cancellation::with_deadline(Duration::from_secs(2));

    let err = client(&transport, -1).books(&deadline).await.unwrap_err();

    assert_eq!(err, ClientError::Cancelled);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_rate_limiter() {
    let transport = MockTransport::new(|_, _| ok_json(json!([])));
    let c = Client::with_config(
        ClientConfig::builder()
            .base_url(BASE_URL)
            .transport(transport.clone())
            .rate_limit(RateLimit::PerInterval {
                interval: Duration::from_secs(1),
                burst: 2,
            })
            .build(),
    );

    let started = tokio::time::Instant::now();
    let cancel = Cancellation::shared();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = c.clone();
            let cancel = Arc::clone(&cancel);
            tokio::spawn(async move { c.books(&cancel).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(transport.calls(), 4);
    assert!(started.elapsed() >= Duration::from_secs(2));
}
