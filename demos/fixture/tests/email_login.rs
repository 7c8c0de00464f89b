//! EmailLoginFacet through the in-process caller.

use backend_facet::FaultCategory;
use backend_testing::TestBackend;
use fixture::EmailLoginFacet;

async fn backend() -> TestBackend {
    TestBackend::start(fixture::register_facets).await.unwrap()
}

#[tokio::test]
async fn test_login_true_for_matching_record() {
    let backend = backend().await;
    backend.register_player("a@b.com", "pw").await.unwrap();

    let login = backend.client().on::<EmailLoginFacet>();
    let ok: bool = login.call("Login", ("a@b.com", "pw")).await.unwrap();
    assert!(ok);
    assert!(backend.client().session_id().is_some());
    assert_eq!(backend.app().sessions().len(), 1);
    let logged_in: bool = login.call("IsLoggedIn", ()).await.unwrap();
    assert!(logged_in);
}

#[tokio::test]
async fn test_login_false_otherwise_without_raising() {
    let backend = backend().await;
    backend.register_player("a@b.com", "pw").await.unwrap();
    let login = backend.client().on::<EmailLoginFacet>();

    for (email, password) in [
        ("a@b.com", "wrong"),
        ("nobody@b.com", "pw"),
        ("not-an-email", "pw"),
        ("a@b.com", ""),
    ] {
        let ok: bool = login.call("Login", (email, password)).await.unwrap();
        assert!(!ok, "{email}/{password} should not log in");
    }
    let logged_in: bool = login.call("IsLoggedIn", ()).await.unwrap();
    assert!(!logged_in);
    assert!(backend.client().session_id().is_none());
    assert!(backend.app().sessions().is_empty());
}

#[tokio::test]
async fn test_login_logout_login_cycle() {
    let backend = backend().await;
    backend.register_player("a@b.com", "pw").await.unwrap();
    let login = backend.client().on::<EmailLoginFacet>();

    assert!(login.call::<bool>("Login", ("a@b.com", "pw")).await.unwrap());
    login.call::<()>("Logout", ()).await.unwrap();
    assert!(!login.call::<bool>("IsLoggedIn", ()).await.unwrap());

    // Logout after logout is a no-op.
    login.call::<()>("Logout", ()).await.unwrap();
    assert!(!login.call::<bool>("IsLoggedIn", ()).await.unwrap());

    assert!(login.call::<bool>("Login", ("a@b.com", "pw")).await.unwrap());
    assert!(login.call::<bool>("IsLoggedIn", ()).await.unwrap());
}

#[tokio::test]
async fn test_register_does_not_log_in() {
    let backend = backend().await;
    let login = backend.client().on::<EmailLoginFacet>();

    assert!(login.call::<bool>("Register", ("New@B.com ", "pw")).await.unwrap());
    assert!(!login.call::<bool>("IsLoggedIn", ()).await.unwrap());
    // Normalised email: a second registration collides.
    assert!(!login.call::<bool>("Register", ("new@b.com", "other")).await.unwrap());
    assert!(login.call::<bool>("Login", ("new@b.com", "pw")).await.unwrap());
}

#[tokio::test]
async fn test_failed_login_keeps_previous_player() {
    let backend = backend().await;
    backend.register_player("a@b.com", "pw").await.unwrap();
    let login = backend.client().on::<EmailLoginFacet>();

    assert!(login.call::<bool>("Login", ("a@b.com", "pw")).await.unwrap());
    assert!(!login.call::<bool>("Login", ("a@b.com", "nope")).await.unwrap());
    assert!(login.call::<bool>("IsLoggedIn", ()).await.unwrap());
}

#[tokio::test]
async fn test_wrong_argument_count_is_argument_fault() {
    let backend = backend().await;
    let err = backend
        .client()
        .call::<bool>("EmailLoginFacet", "Login", ("only-email",))
        .await
        .unwrap_err();
    assert_eq!(err.category, FaultCategory::Argument);
    assert_eq!(backend.store().write_count(), 0);
}
