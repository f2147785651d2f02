use one_crypto::model::{EllipticCurve, PublicKeyComponents, RsaPublicComponents};
use one_crypto::{CryptoProvider, CryptoProviderImpl};
use one_token::TokenError;
use one_token::config::StoreConfig;
use one_token::model::attribute::{Attribute, AttributeType, KeyType, ObjectClass, Template};
use one_token::model::labels::{DEVICE_PRIVATE_KEY_FOR_TLS, DEVICE_PUBLIC_KEY_FOR_TLS};
use one_token::model::mechanism::Mechanism;
use similar_asserts::assert_eq;

use crate::utils::{TestContext, ec_key_pair_templates};

#[tokio::test]
async fn test_generate_ec_key_pair_and_export() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let (public_template, private_template) = ec_key_pair_templates(b"device", false);

    let key_pair = session
        .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
        .await
        .unwrap();
    assert!(key_pair.public_key.is_valid());
    assert!(key_pair.private_key.is_valid());
    assert_ne!(key_pair.public_key, key_pair.private_key);

    let attributes = session
        .get_attribute_value(
            key_pair.public_key,
            &[AttributeType::Class, AttributeType::KeyType, AttributeType::EcPoint],
        )
        .await
        .unwrap();
    let [
        Attribute::Class(ObjectClass::PublicKey),
        Attribute::KeyType(KeyType::Ec),
        Attribute::EcPoint(point),
    ] = attributes.as_slice()
    else {
        panic!("unexpected attributes {attributes:?}");
    };
    assert_eq!(65, point.len());
    assert_eq!(0x04, point[0]);

    let der = session.export_public_key(key_pair.public_key).await.unwrap();
    assert_eq!(91, der.len());
    assert_eq!(
        PublicKeyComponents::Ec {
            curve: EllipticCurve::P256,
            point: point.clone(),
        },
        CryptoProviderImpl::new().decode_public_key_der(&der).unwrap()
    );

    assert!(matches!(
        session.export_public_key(key_pair.private_key).await,
        Err(TokenError::WrongObjectClass {
            class: ObjectClass::PrivateKey,
            ..
        })
    ));
}

#[tokio::test]
async fn test_generate_rsa_key_pair_and_export() {
    let context = TestContext::new_with_config(StoreConfig {
        rsa_modulus_bits: vec![1024],
        ..Default::default()
    });
    let session = context.token.open_session();

    let public_template = Template::new()
        .with(Attribute::ModulusBits(1024))
        .with(Attribute::Label(DEVICE_PUBLIC_KEY_FOR_TLS.to_vec()))
        .with(Attribute::Encrypt(true));
    let private_template = Template::new()
        .with(Attribute::Label(DEVICE_PRIVATE_KEY_FOR_TLS.to_vec()))
        .with(Attribute::Decrypt(true));

    let key_pair = session
        .generate_key_pair(
            Mechanism::RsaPkcsKeyPairGen,
            &public_template,
            &private_template,
        )
        .await
        .unwrap();

    let attributes = session
        .get_attribute_value(
            key_pair.public_key,
            &[AttributeType::Modulus, AttributeType::PublicExponent],
        )
        .await
        .unwrap();
    let [Attribute::Modulus(modulus), Attribute::PublicExponent(public_exponent)] =
        attributes.as_slice()
    else {
        panic!("unexpected attributes {attributes:?}");
    };
    assert_eq!(128, modulus.len());
    assert_eq!(vec![0x01u8, 0x00, 0x01], *public_exponent);

    let der = session.export_public_key(key_pair.public_key).await.unwrap();
    assert_eq!(
        PublicKeyComponents::Rsa(RsaPublicComponents {
            modulus: modulus.clone(),
            public_exponent: public_exponent.clone(),
        }),
        CryptoProviderImpl::new().decode_public_key_der(&der).unwrap()
    );

    let private = session
        .get_attribute_value(
            key_pair.private_key,
            &[
                AttributeType::ModulusBits,
                AttributeType::Modulus,
                AttributeType::Sensitive,
                AttributeType::Private,
                AttributeType::Decrypt,
            ],
        )
        .await
        .unwrap();
    assert_eq!(
        vec![
            Attribute::ModulusBits(1024),
            Attribute::Modulus(modulus.clone()),
            Attribute::Sensitive(true),
            Attribute::Private(true),
            Attribute::Decrypt(true),
        ],
        private
    );

    for attribute_type in [AttributeType::PrivateExponent, AttributeType::Prime1] {
        assert!(matches!(
            session
                .get_attribute_value(key_pair.private_key, &[attribute_type])
                .await,
            Err(TokenError::AttributeSensitive(_))
        ));
    }

    assert!(matches!(
        session
            .set_attribute_value(
                key_pair.private_key,
                &Template::new().with(Attribute::Sensitive(false)),
            )
            .await,
        Err(TokenError::AttributeReadOnly(AttributeType::Sensitive))
    ));

    let found = session
        .find_objects(
            &Template::new()
                .with(Attribute::Class(ObjectClass::PrivateKey))
                .with(Attribute::Label(DEVICE_PRIVATE_KEY_FOR_TLS.to_vec())),
        )
        .await;
    assert_eq!(vec![key_pair.private_key], found);
}

#[tokio::test]
async fn test_generate_rejects_unsupported_requests() {
    let context = TestContext::new();
    let session = context.token.open_session();

    let result = session
        .generate_key_pair(
            Mechanism::EcEdwardsKeyPairGen,
            &Template::new(),
            &Template::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(TokenError::UnsupportedMechanism(Mechanism::EcEdwardsKeyPairGen))
    ));

    let result = session
        .generate_key_pair(
            Mechanism::RsaPkcsKeyPairGen,
            &Template::new().with(Attribute::ModulusBits(1024)),
            &Template::new(),
        )
        .await;
    assert!(matches!(result, Err(TokenError::UnsupportedKeySize(1024))));

    let result = session
        .generate_key_pair(
            Mechanism::EcKeyPairGen,
            &Template::new().with(Attribute::EcParams(vec![0x06, 0x03, 0x2b, 0x65, 0x70])),
            &Template::new(),
        )
        .await;
    assert!(matches!(result, Err(TokenError::InvalidCurveParameters)));

    assert_eq!(0, context.token.store().object_count().await);
}

#[tokio::test]
async fn test_generated_handles_are_distinct_across_pairs() {
    let context = TestContext::new();
    let session = context.token.open_session();

    let mut handles = Vec::new();
    for label in [b"first".as_slice(), b"second".as_slice(), b"third".as_slice()] {
        let (public_template, private_template) = ec_key_pair_templates(label, true);
        let key_pair = session
            .generate_key_pair(Mechanism::EcKeyPairGen, &public_template, &private_template)
            .await
            .unwrap();
        handles.extend([key_pair.public_key, key_pair.private_key]);
    }

    let mut unique = handles.clone();
    unique.dedup();
    assert_eq!(6, unique.len());
    assert_eq!(handles, session.find_objects(&Template::new()).await);
}
