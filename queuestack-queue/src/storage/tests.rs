//! Tests for the in-memory queue backend

use super::*;
use crate::models::{Metadata, MessageTtl, PopReceipt};
use crate::properties::{CorsRule, Logging, RetentionPolicy, ServiceProperties};
use crate::service::{CreateMessageOptions, ListQueuesOptions, QueueService};
use queuestack_core::{Clock, ManualClock, QueueError, StorageAccount};
use std::sync::Arc;
use std::time::Duration;

/// Test helper to create a backend driven by a manual clock
fn service() -> (InMemoryQueueService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let service = InMemoryQueueService::with_clock(StorageAccount::emulator(), clock.clone());
    (service, clock)
}

async fn queue_with_messages(service: &InMemoryQueueService, name: &str, count: usize) {
    service.create_queue(name, Metadata::new()).await.unwrap();
    for i in 1..=count {
        service
            .create_message(name, &format!("test message {i}"), CreateMessageOptions::default())
            .await
            .unwrap();
    }
}

fn metadata(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// =============================================================================
// QUEUE OPERATIONS
// =============================================================================

mod queue_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_queue() {
        let (s, _) = service();
        assert!(s.create_queue("orders", Metadata::new()).await.unwrap());

        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.approximate_message_count.estimate(), 0);
    }

    #[tokio::test]
    async fn test_create_existing_queue_with_same_metadata() {
        let (s, _) = service();
        let md = metadata(&[("owner", "billing")]);
        s.create_queue("orders", md.clone()).await.unwrap();

        assert!(!s.create_queue("orders", md).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_existing_queue_with_different_metadata() {
        let (s, _) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();

        let result = s
            .create_queue("orders", metadata(&[("owner", "billing")]))
            .await;
        assert!(matches!(result, Err(QueueError::QueueAlreadyExists(_))));
        assert_eq!(result.unwrap_err().http_status(), 409);
    }

    #[tokio::test]
    async fn test_create_queue_invalid_name() {
        let (s, _) = service();
        let result = s.create_queue("Orders", Metadata::new()).await;
        assert!(matches!(result, Err(QueueError::InvalidResourceName(_))));
    }

    #[tokio::test]
    async fn test_delete_queue() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 3).await;
        s.delete_queue("orders").await.unwrap();

        let result = s.get_queue_metadata("orders").await;
        assert!(matches!(result, Err(QueueError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_queue_not_found() {
        let (s, _) = service();
        let result = s.delete_queue("missing").await;
        assert!(matches!(result, Err(QueueError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_segment_by_prefix_in_name_order() {
        let (s, _) = service();
        for name in ["beta-2", "alpha-1", "beta-1", "beta-10"] {
            s.create_queue(name, Metadata::new()).await.unwrap();
        }

        let segment = s
            .list_queues_segment(&ListQueuesOptions::with_prefix("beta-"))
            .await
            .unwrap();
        let names: Vec<_> = segment.queues.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["beta-1", "beta-10", "beta-2"]);
        assert!(segment.next_marker.is_none());
        assert!(segment.queues.iter().all(|q| q.metadata.is_none()));
    }

    #[tokio::test]
    async fn test_list_segment_paging() {
        let (s, _) = service();
        for i in 0..5 {
            s.create_queue(&format!("page-{i}"), Metadata::new())
                .await
                .unwrap();
        }

        let first = s
            .list_queues_segment(&ListQueuesOptions::with_prefix("page-").max_results(2))
            .await
            .unwrap();
        assert_eq!(first.queues.len(), 2);
        assert_eq!(first.next_marker.as_deref(), Some("page-2"));

        let options = ListQueuesOptions {
            marker: first.next_marker,
            ..ListQueuesOptions::with_prefix("page-").max_results(2)
        };
        let second = s.list_queues_segment(&options).await.unwrap();
        assert_eq!(second.queues[0].name, "page-2");
        assert_eq!(second.next_marker.as_deref(), Some("page-4"));
    }

    #[tokio::test]
    async fn test_list_segment_includes_metadata() {
        let (s, _) = service();
        s.create_queue("tagged", metadata(&[("team", "core")]))
            .await
            .unwrap();

        let segment = s
            .list_queues_segment(&ListQueuesOptions::with_prefix("tag").include_metadata())
            .await
            .unwrap();
        assert_eq!(
            segment.queues[0].metadata,
            Some(metadata(&[("team", "core")]))
        );
    }

    #[tokio::test]
    async fn test_list_segment_rejects_page_size() {
        let (s, _) = service();
        let result = s
            .list_queues_segment(&ListQueuesOptions::default().max_results(0))
            .await;
        assert!(matches!(result, Err(QueueError::OutOfRangeInput { .. })));

        let result = s
            .list_queues_segment(&ListQueuesOptions::default().max_results(5001))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_and_get_metadata() {
        let (s, _) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();

        let md = metadata(&[
            ("MetadataKey1", "MetaDataValue1"),
            ("MetadataKey2", "MetaDataValue2"),
        ]);
        s.set_queue_metadata("orders", md.clone()).await.unwrap();

        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.metadata, md);

        s.set_queue_metadata("orders", metadata(&[("only", "one")]))
            .await
            .unwrap();
        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.metadata.len(), 1);
    }

    #[tokio::test]
    async fn test_set_invalid_metadata() {
        let (s, _) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();
        let result = s
            .set_queue_metadata("orders", metadata(&[("bad-key", "v")]))
            .await;
        assert!(matches!(result, Err(QueueError::InvalidMetadata(_))));
    }
}

// =============================================================================
// MESSAGE OPERATIONS
// =============================================================================

mod message_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_message_defaults() {
        let (s, clock) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();

        let msg = s
            .create_message("orders", "hello", CreateMessageOptions::default())
            .await
            .unwrap();
        assert_eq!(msg.time_next_visible, clock.now());
        assert_eq!(
            msg.expiration_time,
            Some(clock.now() + chrono::Duration::days(7))
        );
    }

    #[tokio::test]
    async fn test_create_message_queue_not_found() {
        let (s, _) = service();
        let result = s
            .create_message("missing", "hello", CreateMessageOptions::default())
            .await;
        assert!(matches!(result, Err(QueueError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_message_too_large() {
        let (s, _) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();
        let body = "x".repeat(64 * 1024 + 1);
        let result = s
            .create_message("orders", &body, CreateMessageOptions::default())
            .await;
        assert!(matches!(result, Err(QueueError::RequestBodyTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_create_message_visibility_must_precede_expiry() {
        let (s, _) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();
        let options = CreateMessageOptions::default()
            .with_visibility_timeout(Duration::from_secs(120))
            .with_time_to_live(MessageTtl::After(Duration::from_secs(60)));

        let result = s.create_message("orders", "late", options).await;
        assert!(matches!(result, Err(QueueError::OutOfRangeInput { .. })));
    }

    #[tokio::test]
    async fn test_delayed_message_is_hidden_until_visible() {
        let (s, clock) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();
        let options = CreateMessageOptions::default().with_visibility_timeout(Duration::from_secs(30));
        s.create_message("orders", "later", options).await.unwrap();

        assert!(s.peek_messages("orders", 1).await.unwrap().is_empty());
        assert_eq!(
            s.get_queue_metadata("orders")
                .await
                .unwrap()
                .approximate_message_count
                .estimate(),
            1
        );

        clock.advance(Duration::from_secs(30));
        assert_eq!(s.peek_messages("orders", 1).await.unwrap()[0].text, "later");
    }

    #[tokio::test]
    async fn test_peek_is_repeatable() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 10).await;

        let first = s.peek_messages("orders", 5).await.unwrap();
        let second = s.peek_messages("orders", 5).await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert_eq!(first[0].text, "test message 1");
        assert!(first.iter().all(|m| m.dequeue_count == 0));
    }

    #[tokio::test]
    async fn test_peek_count_bounds() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        assert!(s.peek_messages("orders", 0).await.is_err());
        assert!(s.peek_messages("orders", 33).await.is_err());
    }

    #[tokio::test]
    async fn test_get_messages_hides_them() {
        let (s, clock) = service();
        queue_with_messages(&s, "orders", 3).await;

        let leased = s
            .get_messages("orders", 2, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(leased.len(), 2);
        assert_eq!(leased[0].dequeue_count, 1);
        assert_eq!(
            leased[0].time_next_visible,
            clock.now() + chrono::Duration::seconds(60)
        );

        let peeked = s.peek_messages("orders", 32).await.unwrap();
        assert_eq!(peeked.len(), 1);
        assert_eq!(peeked[0].text, "test message 3");
    }

    #[tokio::test]
    async fn test_get_messages_returns_fewer_than_requested() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 2).await;

        let leased = s
            .get_messages("orders", 32, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(leased.len(), 2);

        let again = s
            .get_messages("orders", 32, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_get_messages_visibility_bounds() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        assert!(s.get_messages("orders", 1, Duration::ZERO).await.is_err());
        assert!(s
            .get_messages("orders", 1, Duration::from_secs(7 * 24 * 3600 + 1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_expired_lease_makes_message_visible_again() {
        let (s, clock) = service();
        queue_with_messages(&s, "orders", 1).await;

        let first = s
            .get_messages("orders", 1, Duration::from_secs(10))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(10));

        let second = s
            .get_messages("orders", 1, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].dequeue_count, 2);
        assert_ne!(second[0].pop_receipt, first[0].pop_receipt);
    }

    #[tokio::test]
    async fn test_expired_messages_are_dropped() {
        let (s, clock) = service();
        s.create_queue("orders", Metadata::new()).await.unwrap();
        let options =
            CreateMessageOptions::default().with_time_to_live(MessageTtl::After(Duration::from_secs(5)));
        s.create_message("orders", "short lived", options).await.unwrap();
        s.create_message("orders", "forever", CreateMessageOptions::default().with_time_to_live(MessageTtl::Never))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(5));

        let peeked = s.peek_messages("orders", 32).await.unwrap();
        assert_eq!(peeked.len(), 1);
        assert_eq!(peeked[0].text, "forever");
        assert_eq!(peeked[0].expiration_time, None);
        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.approximate_message_count.estimate(), 1);
    }

    #[tokio::test]
    async fn test_clear_messages() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 4).await;
        s.get_messages("orders", 2, Duration::from_secs(60))
            .await
            .unwrap();

        s.clear_messages("orders").await.unwrap();
        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.approximate_message_count.estimate(), 0);
    }

    #[tokio::test]
    async fn test_clear_messages_queue_not_found() {
        let (s, _) = service();
        let result = s.clear_messages("missing").await;
        assert!(matches!(result, Err(QueueError::QueueNotFound(_))));
    }
}

// =============================================================================
// LEASES
// =============================================================================

mod lease_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_with_current_receipt() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        let leased = s
            .get_messages("orders", 1, Duration::from_secs(60))
            .await
            .unwrap();

        s.delete_message("orders", &leased[0].id, &leased[0].pop_receipt)
            .await
            .unwrap();

        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.approximate_message_count.estimate(), 0);
    }

    #[tokio::test]
    async fn test_delete_with_stale_receipt_keeps_message() {
        let (s, clock) = service();
        queue_with_messages(&s, "orders", 1).await;

        let stale = s
            .get_messages("orders", 1, Duration::from_secs(5))
            .await
            .unwrap()
            .remove(0);
        clock.advance(Duration::from_secs(6));
        let current = s
            .get_messages("orders", 1, Duration::from_secs(60))
            .await
            .unwrap()
            .remove(0);

        let result = s
            .delete_message("orders", &stale.id, &stale.pop_receipt)
            .await;
        assert!(result.as_ref().is_err_and(QueueError::is_lease_error));

        let props = s.get_queue_metadata("orders").await.unwrap();
        assert_eq!(props.approximate_message_count.estimate(), 1);

        s.delete_message("orders", &current.id, &current.pop_receipt)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_after_lease_expired() {
        let (s, clock) = service();
        queue_with_messages(&s, "orders", 1).await;
        let leased = s
            .get_messages("orders", 1, Duration::from_secs(5))
            .await
            .unwrap()
            .remove(0);

        clock.advance(Duration::from_secs(5));

        let result = s
            .delete_message("orders", &leased.id, &leased.pop_receipt)
            .await;
        assert!(matches!(
            result,
            Err(QueueError::LeaseExpiredOrMismatch { .. })
        ));
        assert_eq!(s.peek_messages("orders", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_forged_receipt() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        let leased = s
            .get_messages("orders", 1, Duration::from_secs(60))
            .await
            .unwrap()
            .remove(0);

        let forged = PopReceipt::from("not-a-receipt".to_string());
        let result = s.delete_message("orders", &leased.id, &forged).await;
        assert!(result.is_err_and(|e| e.is_lease_error()));
    }

    #[tokio::test]
    async fn test_delete_unknown_message() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        let result = s
            .delete_message("orders", "no-such-id", &PopReceipt::issue())
            .await;
        assert!(matches!(result, Err(QueueError::MessageNotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_renews_lease_and_text() {
        let (s, clock) = service();
        queue_with_messages(&s, "orders", 1).await;
        let leased = s
            .get_messages("orders", 1, Duration::from_secs(10))
            .await
            .unwrap()
            .remove(0);

        let updated = s
            .update_message(
                "orders",
                &leased.id,
                &leased.pop_receipt,
                Some("rewritten"),
                Duration::from_secs(120),
            )
            .await
            .unwrap();
        assert_ne!(updated.pop_receipt, leased.pop_receipt);

        // The lease now outlives the original timeout.
        clock.advance(Duration::from_secs(60));
        assert!(s.peek_messages("orders", 1).await.unwrap().is_empty());

        let result = s
            .delete_message("orders", &leased.id, &leased.pop_receipt)
            .await;
        assert!(result.is_err_and(|e| e.is_lease_error()));

        clock.advance(Duration::from_secs(60));
        let peeked = s.peek_messages("orders", 1).await.unwrap();
        assert_eq!(peeked[0].text, "rewritten");
    }

    #[tokio::test]
    async fn test_update_with_zero_visibility_releases_message() {
        let (s, _) = service();
        queue_with_messages(&s, "orders", 1).await;
        let leased = s
            .get_messages("orders", 1, Duration::from_secs(60))
            .await
            .unwrap()
            .remove(0);

        s.update_message("orders", &leased.id, &leased.pop_receipt, None, Duration::ZERO)
            .await
            .unwrap();

        let peeked = s.peek_messages("orders", 1).await.unwrap();
        assert_eq!(peeked[0].text, "test message 1");
    }
}

// =============================================================================
// SERVICE PROPERTIES
// =============================================================================

mod properties_tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_are_complete() {
        let (s, _) = service();
        let props = s.get_service_properties().await.unwrap();
        assert_eq!(props, ServiceProperties::service_defaults());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let (s, _) = service();
        let logging = Logging {
            delete: true,
            read: true,
            write: true,
            retention_policy: RetentionPolicy::days(10),
            ..Logging::default()
        };
        let rules = vec![CorsRule::allow_all(&["POST", "GET"], 3600)];
        let update = ServiceProperties::default()
            .with_logging(logging.clone())
            .with_cors_rules(rules.clone());

        s.set_service_properties(&update).await.unwrap();

        let props = s.get_service_properties().await.unwrap();
        assert_eq!(props.logging, Some(logging));
        assert_eq!(props.cors.unwrap().rules, rules);
        assert_eq!(props.hour_metrics, ServiceProperties::service_defaults().hour_metrics);
    }

    #[tokio::test]
    async fn test_invalid_properties_change_nothing() {
        let (s, _) = service();
        let logging = Logging {
            retention_policy: RetentionPolicy::days(0),
            ..Logging::default()
        };
        let update = ServiceProperties::default()
            .with_cors_rules(vec![CorsRule::allow_all(&["GET"], 60)])
            .with_logging(logging);

        let result = s.set_service_properties(&update).await;
        assert!(matches!(result, Err(QueueError::InvalidXmlDocument(_))));
        assert_eq!(
            s.get_service_properties().await.unwrap(),
            ServiceProperties::service_defaults()
        );
    }
}

// =============================================================================
// ACCOUNT AND FAULTS
// =============================================================================

mod account_tests {
    use super::*;

    #[test]
    fn test_connect_emulator_account() {
        let s = InMemoryQueueService::connect(&StorageAccount::emulator()).unwrap();
        assert_eq!(s.account().name, "devstoreaccount1");
    }

    #[test]
    fn test_connect_rejects_bad_key() {
        let account = StorageAccount::new("contoso", "not base64!");
        let result = InMemoryQueueService::connect(&account);
        assert!(matches!(result, Err(QueueError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_connect_rejects_bad_name() {
        let account = StorageAccount::new("Contoso_Prod", "c2VjcmV0");
        let result = InMemoryQueueService::connect(&account);
        assert!(result.is_err_and(|e| e.http_status() == 403));
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let (s, _) = service();
        s.fail_next(
            Operation::CreateQueue,
            QueueError::Transport("connection reset".to_string()),
        );

        let result = s.create_queue("orders", Metadata::new()).await;
        assert!(matches!(result, Err(QueueError::Transport(_))));
        assert!(s.create_queue("orders", Metadata::new()).await.unwrap());
        assert_eq!(s.calls(Operation::CreateQueue), 2);
    }
}
