//! The direct and network strategies are interchangeable.
//!
//! The same call script runs against two fresh backends, one reached
//! in-process and one through the network caller (codec and serve path,
//! over a loopback instead of a broker). Success values must be
//! byte-for-byte equal and faults must have equal categories.

use serde_json::{Value, json};

use backend_facet::{FacetClient, FaultCategory};
use backend_testing::TestBackend;

#[derive(Debug, PartialEq)]
enum Observed {
    Success(Vec<u8>),
    Fault(FaultCategory),
}

async fn observe(client: &FacetClient, facet: &str, method: &str, args: Vec<Value>) -> Observed {
    match client.call_value(facet, method, args).await {
        Ok(value) => Observed::Success(serde_json::to_vec(&value).unwrap()),
        Err(fault) => Observed::Fault(fault.category),
    }
}

async fn script(client: &FacetClient) -> Vec<Observed> {
    let seo = |text: &str, value: u8| json!({ "string_attribute": text, "enum_attribute": value });
    let mut seen = Vec::new();
    seen.push(observe(client, "EmailLoginFacet", "Register", vec![json!("a@b.com"), json!("pw")]).await);
    seen.push(observe(client, "EmailLoginFacet", "Login", vec![json!("a@b.com"), json!("nope")]).await);
    seen.push(observe(client, "EmailLoginFacet", "IsLoggedIn", vec![]).await);
    seen.push(observe(client, "SeoFacet", "Create", vec![seo("x", 1)]).await);
    seen.push(observe(client, "Nope", "Login", vec![]).await);
    seen.push(observe(client, "EmailLoginFacet", "Nope", vec![]).await);
    seen.push(observe(client, "EmailLoginFacet", "Login", vec![json!("a@b.com")]).await);
    seen.push(observe(client, "EmailLoginFacet", "Login", vec![json!("a@b.com"), json!(5)]).await);
    seen.push(observe(client, "EmailLoginFacet", "Login", vec![json!("a@b.com"), json!("pw")]).await);

    // Entity ids are random, so only the shape of Create's result is compared.
    let created = client
        .call_value("SeoFacet", "Create", vec![seo("first", 2)])
        .await
        .map(|id| id.is_string());
    seen.push(match created {
        Ok(is_string) => Observed::Success(vec![u8::from(is_string)]),
        Err(fault) => Observed::Fault(fault.category),
    });
    client
        .call_value("SeoFacet", "Create", vec![seo("second", 3)])
        .await
        .unwrap();

    seen.push(observe(client, "SeoFacet", "All", vec![]).await);
    seen.push(observe(client, "SeoFacet", "FindByString", vec![json!("second")]).await);
    seen.push(observe(client, "SeoFacet", "FindByString", vec![json!("missing")]).await);
    seen.push(observe(client, "SeoFacet", "Delete", vec![json!("no-such-id")]).await);
    seen.push(observe(client, "EmailLoginFacet", "Logout", vec![]).await);
    seen.push(observe(client, "SeoFacet", "All", vec![]).await);
    seen
}

#[tokio::test]
async fn test_direct_and_network_strategies_match() {
    let direct_backend = TestBackend::start(fixture::register_facets).await.unwrap();
    let network_backend = TestBackend::start(fixture::register_facets).await.unwrap();

    let direct = script(direct_backend.client()).await;
    let network = script(&network_backend.network_client()).await;

    assert_eq!(direct, network);
    assert_eq!(
        direct[0..8],
        [
            Observed::Success(b"true".to_vec()),
            Observed::Success(b"false".to_vec()),
            Observed::Success(b"false".to_vec()),
            Observed::Fault(FaultCategory::Authorization),
            Observed::Fault(FaultCategory::FacetNotFound),
            Observed::Fault(FaultCategory::MethodNotFound),
            Observed::Fault(FaultCategory::Argument),
            Observed::Fault(FaultCategory::Argument),
        ]
    );
    assert_eq!(direct[13], Observed::Fault(FaultCategory::Authorization));
    assert_eq!(direct[15], Observed::Fault(FaultCategory::Authorization));
    assert_eq!(
        direct_backend.store().write_count(),
        network_backend.store().write_count()
    );
}
