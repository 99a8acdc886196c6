mod common;

use acmex_core::prelude::*;
use common::MockAcmeServer;
use std::sync::Arc;

#[tokio::test]
async fn creates_an_order_and_fetches_its_authorizations() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let url = mock_server.url();

    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;
    let _m_order = mock_server.mock_new_order().await;
    let _m_authz = mock_server.mock_authorization().await;

    let registry = Registry::default();
    let session = Arc::new(Session::new(
        &format!("{}/directory", url),
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();
    let (_login, account, _already_existed) = Account::create(
        session,
        signer,
        NewAccountRequest::new().agree_to_terms_of_service(),
    )
    .await?;

    let identifier = Identifier::dns("example.com")?;
    let order = account.new_order(vec![identifier], None, None, None).await?;

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.identifiers().len(), 1);
    assert_eq!(order.identifiers()[0].value, "example.com");
    assert_eq!(order.url(), format!("{}/order/1", url));

    let authorizations = order.authorizations().await?;
    assert_eq!(authorizations.len(), 1);
    let authz = &authorizations[0];
    assert_eq!(authz.identifier().value, "example.com");
    assert_eq!(authz.status(), AuthorizationStatus::Pending);

    let challenge = authz
        .find_challenge(ChallengeType::Http01)
        .expect("mock authorization offers http-01");
    assert_eq!(challenge.token(), "test-token-abc");

    Ok(())
}

#[tokio::test]
async fn new_order_rejects_an_empty_identifier_list() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let url = mock_server.url();

    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let registry = Registry::default();
    let session = Arc::new(Session::new(
        &format!("{}/directory", url),
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();
    let (_login, account, _already_existed) = Account::create(
        session,
        signer,
        NewAccountRequest::new().agree_to_terms_of_service(),
    )
    .await?;

    let err = account.new_order(vec![], None, None, None).await.unwrap_err();
    assert!(matches!(err, AcmeError::InvalidInput(_)));

    Ok(())
}
