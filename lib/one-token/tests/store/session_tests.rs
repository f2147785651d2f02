use one_crypto::pem::FieldLayout;
use one_token::TokenError;
use one_token::model::attribute::{Attribute, AttributeType, Template};
use one_token::model::mechanism::Mechanism;
use similar_asserts::assert_eq;

use crate::utils::{TestContext, ec_key_pair_templates, rsa_fixture, rsa_private_template};

#[tokio::test]
async fn test_close_session_keeps_token_objects() {
    let context = TestContext::new();
    let session = context.token.open_session();

    let (public_template, private_template) = ec_key_pair_templates(b"session", false);
    let session_pair = session
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();
    let token_object = session
        .import_object(&rsa_private_template(
            &rsa_fixture(FieldLayout::Exact),
            b"persistent",
        ))
        .await
        .unwrap();
    assert_eq!(3, context.token.store().object_count().await);

    session.close().await.unwrap();

    let store = context.token.store();
    assert_eq!(vec![token_object], store.find_objects(&Template::new()).await);
    assert!(matches!(
        store
            .get_attribute_value(session_pair.public_key, &[AttributeType::Label])
            .await,
        Err(TokenError::HandleNotFound(_))
    ));
}

#[tokio::test]
async fn test_session_object_destroyed_by_other_session() {
    let context = TestContext::new();
    let owner = context.token.open_session();
    let other = context.token.open_session();

    let (public_template, private_template) = ec_key_pair_templates(b"shared", false);
    let key_pair = owner
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();

    other.destroy_object(key_pair.private_key).await.unwrap();
    owner.close().await.unwrap();

    assert_eq!(0, context.token.store().object_count().await);
}

#[tokio::test]
async fn test_destroyed_handles_are_not_reused() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let (public_template, private_template) = ec_key_pair_templates(b"", true);

    let first = session
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();
    session.destroy_object(first.public_key).await.unwrap();
    session.destroy_object(first.private_key).await.unwrap();

    let second = session
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();

    assert!(second.public_key > first.private_key);
    assert!(second.private_key > first.private_key);
    assert!(matches!(
        session.destroy_object(first.public_key).await,
        Err(TokenError::HandleNotFound(_))
    ));
}

#[tokio::test]
async fn test_relabel_and_find() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let (public_template, private_template) = ec_key_pair_templates(b"before", true);
    let key_pair = session
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();

    session
        .set_attribute_value(
            key_pair.public_key,
            &Template::new().with(Attribute::Label(b"after".to_vec())),
        )
        .await
        .unwrap();

    assert_eq!(
        vec![key_pair.public_key],
        session
            .find_objects(&Template::new().with(Attribute::Label(b"after".to_vec())))
            .await
    );
    assert_eq!(
        vec![key_pair.private_key],
        session
            .find_objects(&Template::new().with(Attribute::Label(b"before".to_vec())))
            .await
    );
}
