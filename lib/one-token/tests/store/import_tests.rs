use std::collections::HashSet;
use std::sync::Arc;

use one_crypto::model::{EllipticCurve, PublicKeyComponents, RsaPublicComponents};
use one_crypto::pem::FieldLayout;
use one_crypto::{CryptoProvider, CryptoProviderImpl};
use one_token::TokenError;
use one_token::config::StoreConfig;
use one_token::model::attribute::{Attribute, AttributeType, KeyType, ObjectClass, Template};
use one_token::model::labels::{DEVICE_PRIVATE_KEY_FOR_TLS, DEVICE_PUBLIC_KEY_FOR_TLS};
use one_token::model::padding::PaddingConvention;
use secrecy::ExposeSecret;
use similar_asserts::assert_eq;

use crate::utils::{TestContext, rsa_fixture, rsa_private_template, rsa_public_template};

#[tokio::test]
async fn test_import_sign_byte_pem_key_round_trip() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let padded = rsa_fixture(FieldLayout::SignBytePrefixed);
    let exact = rsa_fixture(FieldLayout::Exact);

    let handle = session
        .import_object_with_padding(
            &rsa_private_template(&padded, DEVICE_PRIVATE_KEY_FOR_TLS),
            PaddingConvention::SignByte,
        )
        .await
        .unwrap();

    let attributes = session
        .get_attribute_value(
            handle,
            &[
                AttributeType::ModulusBits,
                AttributeType::Modulus,
                AttributeType::PublicExponent,
                AttributeType::PrivateExponent,
                AttributeType::Prime1,
                AttributeType::Prime2,
                AttributeType::Exponent1,
                AttributeType::Exponent2,
                AttributeType::Coefficient,
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        vec![
            Attribute::ModulusBits(2048),
            Attribute::Modulus(exact.modulus.clone()),
            Attribute::PublicExponent(exact.public_exponent.clone()),
            Attribute::PrivateExponent(exact.private_exponent.expose_secret().to_vec()),
            Attribute::Prime1(exact.prime_1.expose_secret().to_vec()),
            Attribute::Prime2(exact.prime_2.expose_secret().to_vec()),
            Attribute::Exponent1(exact.exponent_1.expose_secret().to_vec()),
            Attribute::Exponent2(exact.exponent_2.expose_secret().to_vec()),
            Attribute::Coefficient(exact.coefficient.expose_secret().to_vec()),
        ],
        attributes
    );

    let found = session
        .find_objects(&Template::new().with(Attribute::Label(DEVICE_PRIVATE_KEY_FOR_TLS.to_vec())))
        .await;
    assert_eq!(vec![handle], found);
}

#[tokio::test]
async fn test_import_lenient_accepts_both_layouts() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);
    let padded = rsa_fixture(FieldLayout::SignBytePrefixed);

    let first = session
        .import_object(&rsa_private_template(&exact, b"exact"))
        .await
        .unwrap();
    let second = session
        .import_object(&rsa_private_template(&padded, b"padded"))
        .await
        .unwrap();

    let first = session
        .get_attribute_value(first, &[AttributeType::Modulus])
        .await
        .unwrap();
    let second = session
        .get_attribute_value(second, &[AttributeType::Modulus])
        .await
        .unwrap();
    assert_eq!(vec![Attribute::Modulus(exact.modulus.clone())], first);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_import_modulus_length_mismatch() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    let mut short = exact.modulus.clone();
    short.pop();
    let mut long = exact.modulus.clone();
    long.push(0x01);

    for modulus in [short, long] {
        let length = modulus.len();
        let result = session
            .import_object_with_padding(
                &rsa_public_template(modulus, exact.public_exponent.clone()),
                PaddingConvention::Exact,
            )
            .await;

        assert!(matches!(
            result,
            Err(TokenError::InvalidAttributeLength {
                attribute: AttributeType::Modulus,
                length: actual
            }) if actual == length
        ));
    }

    assert_eq!(0, context.token.store().object_count().await);
}

#[tokio::test]
async fn test_import_default_convention_one_byte_longer_modulus() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    let mut sign_byte = vec![0x00];
    sign_byte.extend_from_slice(&exact.modulus);
    let handle = session
        .import_object(&rsa_public_template(
            sign_byte,
            exact.public_exponent.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(
        vec![Attribute::Modulus(exact.modulus.clone())],
        session
            .get_attribute_value(handle, &[AttributeType::Modulus])
            .await
            .unwrap()
    );

    let mut long = vec![0x01];
    long.extend_from_slice(&exact.modulus);
    let result = session
        .import_object(&rsa_public_template(long, exact.public_exponent.clone()))
        .await;
    assert!(matches!(
        result,
        Err(TokenError::InvalidAttributeLength {
            attribute: AttributeType::Modulus,
            length: 257
        })
    ));
    assert_eq!(1, context.token.store().object_count().await);
}

#[tokio::test]
async fn test_import_unsupported_declared_size() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    let result = session
        .import_object(
            &rsa_public_template(exact.modulus.clone(), exact.public_exponent.clone())
                .with(Attribute::ModulusBits(1024)),
        )
        .await;

    assert!(matches!(result, Err(TokenError::UnsupportedKeySize(1024))));
}

#[tokio::test]
async fn test_import_rsa_public_key_and_export() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    let handle = session
        .import_object(
            &rsa_public_template(exact.modulus.clone(), exact.public_exponent.clone())
                .with(Attribute::Label(DEVICE_PUBLIC_KEY_FOR_TLS.to_vec())),
        )
        .await
        .unwrap();

    let der = session.export_public_key(handle).await.unwrap();
    let decoded = CryptoProviderImpl::new().decode_public_key_der(&der).unwrap();

    assert_eq!(
        PublicKeyComponents::Rsa(RsaPublicComponents {
            modulus: exact.modulus.clone(),
            public_exponent: exact.public_exponent.clone(),
        }),
        decoded
    );
}

#[tokio::test]
async fn test_import_wrong_side_usage() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    let result = session
        .import_object(
            &rsa_public_template(exact.modulus.clone(), exact.public_exponent.clone())
                .with(Attribute::Decrypt(true)),
        )
        .await;

    assert!(matches!(
        result,
        Err(TokenError::AttributeConflict(AttributeType::Decrypt))
    ));
}

#[tokio::test]
async fn test_import_ec_invalid_curve() {
    let context = TestContext::new();
    let session = context.token.open_session();

    let mut point = vec![0x04];
    point.extend([0x01; 64]);
    let template = Template::new()
        .with(Attribute::Class(ObjectClass::PublicKey))
        .with(Attribute::KeyType(KeyType::Ec))
        .with(Attribute::EcParams(vec![0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x22]))
        .with(Attribute::EcPoint(point));

    let result = session.import_object(&template).await;
    assert!(matches!(result, Err(TokenError::InvalidCurveParameters)));
}

#[tokio::test]
async fn test_import_rejects_off_curve_point() {
    let context = TestContext::new();
    let session = context.token.open_session();

    let mut point = vec![0x04];
    point.extend([0x01; 64]);
    let result = session
        .import_object(
            &Template::new()
                .with(Attribute::Class(ObjectClass::PublicKey))
                .with(Attribute::KeyType(KeyType::Ec))
                .with(Attribute::EcParams(EllipticCurve::P256.ec_params().to_vec()))
                .with(Attribute::EcPoint(point)),
        )
        .await;

    assert!(matches!(
        result,
        Err(TokenError::InvalidAttributeValue(AttributeType::EcPoint))
    ));
    assert_eq!(0, context.token.store().object_count().await);
}

#[tokio::test]
async fn test_import_rejects_unencodable_public_exponent() {
    let context = TestContext::new();
    let session = context.token.open_session();
    let exact = rsa_fixture(FieldLayout::Exact);

    for public_exponent in [vec![0xffu8; 8], vec![0x01u8]] {
        let result = session
            .import_object(&rsa_public_template(
                exact.modulus.clone(),
                public_exponent,
            ))
            .await;

        assert!(matches!(
            result,
            Err(TokenError::InvalidAttributeValue(AttributeType::PublicExponent))
        ));
    }
    assert_eq!(0, context.token.store().object_count().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_imports_get_unique_handles() {
    let context = TestContext::new_with_config(StoreConfig {
        unique_labels: false,
        ..Default::default()
    });
    let store = context.token.store();
    let key_pair = CryptoProviderImpl::new()
        .generate_ec_key_pair(EllipticCurve::P256)
        .unwrap();
    let template = Arc::new(
        Template::new()
            .with(Attribute::Class(ObjectClass::PublicKey))
            .with(Attribute::KeyType(KeyType::Ec))
            .with(Attribute::EcParams(EllipticCurve::P256.ec_params().to_vec()))
            .with(Attribute::EcPoint(key_pair.point)),
    );

    let tasks: Vec<_> = (0..64)
        .map(|_| {
            let store = store.clone();
            let template = template.clone();
            tokio::spawn(async move { store.import_object(&template).await.unwrap() })
        })
        .collect();

    let mut handles = HashSet::new();
    for task in tasks {
        assert!(handles.insert(task.await.unwrap()));
    }

    assert_eq!(64, handles.len());
    assert_eq!(64, store.object_count().await);
}
