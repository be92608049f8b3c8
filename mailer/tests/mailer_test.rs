use mockito::{Matcher, Server};
use plantmail::mail::OperationState;
use plantmail::{AcsMailer, CareNeeds, Delivery, Email, EmailSettings, MailError, Mailer, Notifier};
use serde_json::json;

fn settings(server: &Server) -> EmailSettings {
    EmailSettings {
        connection_string: Some(format!("endpoint={}/;accesskey=c2VjcmV0", server.url())),
        sender_address: Some("DoNotReply@plants.example".into()),
        poll_interval: 0,
        poll_timeout: 10,
        ..Default::default()
    }
}

fn email() -> Email {
    Email::builder()
        .to_named("ann@example.com", "ann")
        .subject("Fern needs some care!")
        .text("Time to water Fern")
        .html("<html><p>Time to water Fern</p></html>")
        .build()
        .unwrap()
}

#[tokio::test]
async fn send_polls_until_succeeded() {
    let mut server = Server::new_async().await;

    let send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::UrlEncoded(
            "api-version".into(),
            "2023-03-31".into(),
        ))
        .match_header(
            "authorization",
            Matcher::Regex(
                "^HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature=".into(),
            ),
        )
        .match_header("x-ms-date", Matcher::Regex("GMT$".into()))
        .match_header("x-ms-content-sha256", Matcher::Any)
        .match_header("repeatability-request-id", Matcher::Any)
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "senderAddress": "DoNotReply@plants.example",
            "content": {
                "subject": "Fern needs some care!",
                "plainText": "Time to water Fern",
            },
        })))
        .with_status(202)
        .with_header(
            "operation-location",
            &format!(
                "{}/emails/operations/op-1?api-version=2023-03-31",
                server.url()
            ),
        )
        .with_body(r#"{"id":"op-1","status":"Running"}"#)
        .expect(1)
        .create_async()
        .await;

    let status = server
        .mock("GET", "/emails/operations/op-1")
        .match_query(Matcher::Any)
        .match_header("authorization", Matcher::Regex("^HMAC-SHA256 ".into()))
        .with_status(200)
        .with_body(r#"{"id":"op-1","status":"Succeeded"}"#)
        .expect(1)
        .create_async()
        .await;

    let mailer = AcsMailer::from_config(&settings(&server)).unwrap();
    let receipt = mailer.send(&email()).await.unwrap();

    assert_eq!(receipt.id, "op-1");
    assert_eq!(receipt.status, OperationState::Succeeded);
    send.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn failed_operation_is_a_delivery_error() {
    let mut server = Server::new_async().await;

    // No Operation-Location: the mailer derives the status URL from the id
    let _send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .with_status(202)
        .with_body(r#"{"id":"op-2","status":"NotStarted"}"#)
        .create_async()
        .await;

    let status = server
        .mock("GET", "/emails/operations/op-2")
        .match_query(Matcher::UrlEncoded(
            "api-version".into(),
            "2023-03-31".into(),
        ))
        .with_status(200)
        .with_body(
            r#"{"id":"op-2","status":"Failed","error":{"code":"Rejected","message":"Recipient mailbox is full"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let mailer = AcsMailer::from_config(&settings(&server)).unwrap();
    let err = mailer.send(&email()).await.unwrap_err();

    match err {
        MailError::Delivery {
            id,
            status,
            message,
        } => {
            assert_eq!(id, "op-2");
            assert_eq!(status, OperationState::Failed);
            assert_eq!(message, "Recipient mailbox is full");
        }
        other => panic!("unexpected error: {other}"),
    }
    status.assert_async().await;
}

#[tokio::test]
async fn rejected_request_is_an_api_error() {
    let mut server = Server::new_async().await;

    let _send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":"Denied","message":"Denied by the resource provider."}}"#)
        .create_async()
        .await;

    let mailer = AcsMailer::from_config(&settings(&server)).unwrap();
    let err = mailer.send(&email()).await.unwrap_err();

    assert!(
        matches!(&err, MailError::Api { status: 401, code, .. } if code == "Denied"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn non_accepted_success_is_an_api_error() {
    let mut server = Server::new_async().await;

    let _send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":"op-3","status":"Succeeded"}"#)
        .create_async()
        .await;

    let mailer = AcsMailer::from_config(&settings(&server)).unwrap();
    let err = mailer.send(&email()).await.unwrap_err();

    assert!(
        matches!(&err, MailError::Api { status: 200, .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn retry_after_sets_poll_cadence() {
    let mut server = Server::new_async().await;

    let _send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .with_status(202)
        .with_header("retry-after", "0")
        .with_body(r#"{"id":"op-4","status":"Running"}"#)
        .create_async()
        .await;

    let status = server
        .mock("GET", "/emails/operations/op-4")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":"op-4","status":"Succeeded"}"#)
        .expect(1)
        .create_async()
        .await;

    // The fallback interval alone would outlast the timeout
    let settings = EmailSettings {
        poll_interval: 30,
        poll_timeout: 5,
        ..settings(&server)
    };
    let mailer = AcsMailer::from_config(&settings).unwrap();
    let receipt = mailer.send(&email()).await.unwrap();

    assert_eq!(receipt.id, "op-4");
    status.assert_async().await;
}

#[tokio::test]
async fn invalid_address_never_reaches_provider() {
    let mut server = Server::new_async().await;

    let send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let email = Email::builder()
        .to("ann at example dot com")
        .subject("s")
        .text("t")
        .build()
        .unwrap();

    let mailer = AcsMailer::from_config(&settings(&server)).unwrap();
    let err = mailer.send(&email).await.unwrap_err();

    assert!(matches!(err, MailError::InvalidAddress(_)));
    send.assert_async().await;
}

#[tokio::test]
async fn debug_recipient_skips_provider() {
    let mut server = Server::new_async().await;

    let send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut settings = settings(&server);
    settings.debug_email = Some("dev@example.com".into());

    let notifier = Notifier::from_settings(&settings);
    let delivery = notifier
        .send_care_email("ann@example.com", "Fern", "ann", CareNeeds::new(false, true))
        .await
        .unwrap();

    assert_eq!(delivery, Delivery::Suppressed);
    send.assert_async().await;
}

#[tokio::test]
async fn debug_recipient_does_not_block_generic_mail() {
    let mut server = Server::new_async().await;

    let send = server
        .mock("POST", "/emails:send")
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex(r#""address":"ann@example.com""#.into()))
        .with_status(202)
        .with_body(r#"{"id":"op-5","status":"Running"}"#)
        .expect(1)
        .create_async()
        .await;

    let _status = server
        .mock("GET", "/emails/operations/op-5")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":"op-5","status":"Succeeded"}"#)
        .create_async()
        .await;

    let mut settings = settings(&server);
    settings.debug_email = Some("dev@example.com".into());

    let notifier = Notifier::from_settings(&settings);
    let delivery = notifier
        .send_email("ann@example.com", "Click to reset your password", "Password reset")
        .await
        .unwrap();

    assert!(matches!(delivery, Delivery::Sent(_)));
    send.assert_async().await;
}
