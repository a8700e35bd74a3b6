//! Contract Test: Route 53 Domains HTTP Protocol
//!
//! Runs the gateway against a local mock of the JSON 1.1 endpoint.
//!
//! Constraints verified:
//! - Every call is a signed `POST /` with the right target and content type
//! - List calls follow `NextPageMarker` to the end
//! - Nested and enum-valued responses decode into core model types
//! - HTTP and API errors become gateway errors
//! - Dry-run sends reads but never mutations

use domreg_core::model::{
    Availability, Contact, ContactType, DesiredDomainState, OperationFilter, OperationStatus,
    RegisterDomainRequest, TransferDomainRequest, Transferability,
};
use domreg_core::traits::RegistrarGateway;
use domreg_gateway_route53::{Credentials, DRY_RUN_OPERATION_ID, Route53Gateway};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TARGET_PREFIX: &str = "Route53Domains_v20140515";

fn target(operation: &str) -> String {
    format!("{}.{}", TARGET_PREFIX, operation)
}

fn gateway(server: &MockServer, dry_run: bool) -> Route53Gateway {
    Route53Gateway::new(
        Credentials::new("AKIDEXAMPLE", "secret", Some("session".to_string())),
        "us-east-1",
        Some(&server.uri()),
        dry_run,
    )
    .expect("gateway construction succeeds")
}

fn desired() -> DesiredDomainState {
    DesiredDomainState::new(
        "foo.com",
        Contact {
            first_name: "Joe".to_string(),
            last_name: "Bob".to_string(),
            contact_type: Some(ContactType::Person),
            address_line_1: "PO Box 123".to_string(),
            city: "Nowhere".to_string(),
            state: "CA".to_string(),
            country_code: "US".to_string(),
            zip_code: "91222".to_string(),
            phone_number: "+1.3035551212".to_string(),
            email: "joe@bob.com".to_string(),
        },
        true,
    )
}

#[tokio::test]
async fn requests_are_signed_json_posts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", target("CheckDomainAvailability").as_str()))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header("x-amz-security-token", "session"))
        .and(header_exists("x-amz-date"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({"DomainName": "foo.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Availability": "AVAILABLE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let availability = gateway(&server, false)
        .check_domain_availability("foo.com")
        .await
        .unwrap();

    assert_eq!(availability, Availability::Available);
}

#[tokio::test]
async fn list_domains_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListDomains").as_str()))
        .and(body_partial_json(json!({"Marker": "page-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Domains": [{"DomainName": "c.com", "AutoRenew": false}]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListDomains").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Domains": [
                {"DomainName": "a.com", "AutoRenew": true, "TransferLock": true, "Expiry": 1.7e9},
                {"DomainName": "b.com"}
            ],
            "NextPageMarker": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let domains = gateway(&server, false).list_domains().await.unwrap();

    let names: Vec<&str> = domains.iter().map(|d| d.domain_name.as_str()).collect();
    assert_eq!(names, vec!["a.com", "b.com", "c.com"]);
    assert_eq!(domains[0].auto_renew, Some(true));
}

#[tokio::test]
async fn list_operations_sends_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListOperations").as_str()))
        .and(body_partial_json(json!({
            "Status": ["IN_PROGRESS"],
            "Type": ["TRANSFER_IN_DOMAIN"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Operations": [{
                "OperationId": "op-1",
                "Status": "IN_PROGRESS",
                "Type": "TRANSFER_IN_DOMAIN",
                "DomainName": "foo.com",
                "SubmittedDate": 1.7e9
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operations = gateway(&server, false)
        .list_operations(&OperationFilter::transfers_in_progress())
        .await
        .unwrap();

    assert_eq!(operations.len(), 1);
    assert!(operations[0].is_transfer_in_progress_for("foo.com"));
}

#[tokio::test]
async fn domain_detail_decodes_contacts_and_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetDomainDetail").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DomainName": "foo.com",
            "Nameservers": [{"Name": "ns1.example.net", "GlueIps": []}],
            "AutoRenew": true,
            "AdminContact": {"FirstName": "Joe", "ContactType": "PERSON", "Email": "joe@bob.com"},
            "RegistrantContact": {"FirstName": "Joe"},
            "TechContact": {"FirstName": "Joe"},
            "AdminPrivacy": true,
            "StatusList": ["clientTransferProhibited"],
            "RegistrarName": "Amazon Registrar, Inc."
        })))
        .mount(&server)
        .await;

    let detail = gateway(&server, false)
        .get_domain_detail("foo.com")
        .await
        .unwrap();

    assert_eq!(detail.nameserver_names(), vec!["ns1.example.net"]);
    assert_eq!(detail.auto_renew, Some(true));
    let admin = detail.admin_contact.unwrap();
    assert_eq!(admin.contact_type, Some(ContactType::Person));
    assert_eq!(admin.email.as_deref(), Some("joe@bob.com"));
    assert!(!detail.status_list.is_empty());
}

#[tokio::test]
async fn transferability_and_operation_detail_decode() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("CheckDomainTransferability").as_str()))
        .and(body_partial_json(json!({"DomainName": "foo.com", "AuthCode": "code"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Transferability": {"Transferable": "DOMAIN_IN_ANOTHER_ACCOUNT"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetOperationDetail").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OperationId": "op-1",
            "Status": "IN_PROGRESS",
            "Type": "TRANSFER_IN_DOMAIN",
            "DomainName": "foo.com",
            "Message": "Waiting for authorization"
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server, false);

    assert_eq!(
        gateway
            .check_domain_transferability("foo.com", "code")
            .await
            .unwrap(),
        Transferability::DomainInAnotherAccount
    );

    let detail = gateway.get_operation_detail("op-1").await.unwrap();
    assert_eq!(detail.status, OperationStatus::InProgress);
    assert_eq!(detail.message.as_deref(), Some("Waiting for authorization"));
}

#[tokio::test]
async fn mutations_return_operation_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("RegisterDomain").as_str()))
        .and(body_partial_json(json!({
            "DomainName": "foo.com",
            "DurationInYears": 1,
            "PrivacyProtectAdminContact": true,
            "AdminContact": {"FirstName": "Joe", "ContactType": "PERSON", "ZipCode": "91222"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"OperationId": "op-reg"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("UpdateDomainNameservers").as_str()))
        .and(body_partial_json(json!({
            "DomainName": "foo.com",
            "Nameservers": [{"Name": "ns1.example.net"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"OperationId": "op-ns"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("EnableDomainAutoRenew").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, false);
    let desired = desired();

    let id = gateway
        .register_domain(&RegisterDomainRequest::for_desired(&desired))
        .await
        .unwrap();
    assert_eq!(id, "op-reg");

    let id = gateway
        .update_domain_nameservers("foo.com", &["ns1.example.net".to_string()])
        .await
        .unwrap();
    assert_eq!(id, "op-ns");

    // Empty body decodes as an empty object
    gateway.enable_domain_auto_renew("foo.com").await.unwrap();
}

#[tokio::test]
async fn api_error_becomes_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.route53domains#InvalidInput",
            "message": "Domain name is not valid"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server, false)
        .get_domain_detail("foo.com")
        .await
        .unwrap_err();

    assert!(err.is_gateway());
    let text = err.to_string();
    assert!(text.contains("GetDomainDetail"));
    assert!(text.contains("InvalidInput"));
    assert!(text.contains("Domain name is not valid"));
}

#[tokio::test]
async fn server_error_is_transient_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = gateway(&server, false).list_domains().await.unwrap_err();

    assert!(err.is_gateway());
    assert!(err.to_string().contains("503"));
}

/// Serve one request, then cut the response body short
async fn truncated_body_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/x-amz-json-1.1\r\n\
                  Content-Length: 100\r\n\r\n\
                  {\"Domains\"",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn body_read_failure_is_reported_as_such() {
    let endpoint = truncated_body_server().await;
    let gateway = Route53Gateway::new(
        Credentials::new("AKIDEXAMPLE", "secret", None),
        "us-east-1",
        Some(&endpoint),
        false,
    )
    .unwrap();

    let err = gateway.list_domains().await.unwrap_err();

    assert!(err.is_gateway());
    let text = err.to_string();
    assert!(text.contains("ListDomains"));
    assert!(text.contains("failed to read response body"));
    assert!(!text.contains("failed to parse response"));
}

#[tokio::test]
async fn dry_run_reads_but_never_mutates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("CheckDomainTransferability").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Transferability": {"Transferable": "TRANSFERABLE"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    for operation in [
        "RegisterDomain",
        "TransferDomain",
        "UpdateDomainNameservers",
        "UpdateDomainContact",
        "EnableDomainAutoRenew",
        "DisableDomainAutoRenew",
    ] {
        Mock::given(method("POST"))
            .and(header("x-amz-target", target(operation).as_str()))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
    }

    let gateway = gateway(&server, true);
    let desired = desired()
        .with_name_servers(["ns1.example.net"])
        .with_transfer_auth_code("code");

    assert_eq!(
        gateway
            .check_domain_transferability("foo.com", "code")
            .await
            .unwrap(),
        Transferability::Transferable
    );

    let id = gateway
        .transfer_domain(&TransferDomainRequest::for_desired(&desired, "code"))
        .await
        .unwrap();
    assert_eq!(id, DRY_RUN_OPERATION_ID);

    gateway
        .register_domain(&RegisterDomainRequest::for_desired(&desired))
        .await
        .unwrap();
    gateway
        .update_domain_nameservers("foo.com", &desired.name_servers)
        .await
        .unwrap();
    gateway
        .update_domain_contact("foo.com", &desired.contact)
        .await
        .unwrap();
    gateway.enable_domain_auto_renew("foo.com").await.unwrap();
    gateway.disable_domain_auto_renew("foo.com").await.unwrap();
}
