use protocurl_core::resolver::{self, ResolutionError, TypeIdentifier};

mod common;

#[test]
fn test_exact_name_resolves() {
    let registry = common::registry();

    let descriptor = resolver::resolve(&registry, &TypeIdentifier::parse("shop.Order")).unwrap();
    assert_eq!(descriptor.full_name(), "shop.Order");

    let nested =
        resolver::resolve(&registry, &TypeIdentifier::parse("shop.Order.Line.Item")).unwrap();
    assert_eq!(nested.full_name(), "shop.Order.Line.Item");
}

#[test]
fn test_bare_name_resolves_when_unique() {
    let registry = common::registry();

    let ping = resolver::resolve(&registry, &TypeIdentifier::parse("..Ping")).unwrap();
    assert_eq!(ping.full_name(), "happyday.Ping");

    let details = resolver::resolve(&registry, &TypeIdentifier::parse("..Details")).unwrap();
    assert_eq!(details.full_name(), "happyday.HappyDayResponse.Details");

    let line = resolver::resolve(&registry, &TypeIdentifier::parse("..Line")).unwrap();
    assert_eq!(line.full_name(), "shop.Order.Line");
}

#[test]
fn test_ambiguous_bare_name_lists_every_candidate() {
    let registry = common::registry();

    let err = resolver::resolve(&registry, &TypeIdentifier::parse("..Item")).unwrap_err();
    let message = err.to_string();

    let ResolutionError::Ambiguous { name, candidates } = err else {
        panic!("Expected an ambiguous name: {message}");
    };

    assert_eq!(name, "Item");
    assert_eq!(
        candidates,
        vec!["other.Item", "shop.Item", "shop.Order.Line.Item"]
    );
    assert!(message.contains("Found 3 messages"));
    assert!(message.contains("other.Item, shop.Item, shop.Order.Line.Item"));
}

#[test]
fn test_unknown_names_are_not_found() {
    let registry = common::registry();

    for identifier in ["..Ghost", "happyday.Ghost", "Ping"] {
        assert!(
            matches!(
                resolver::resolve(&registry, &TypeIdentifier::parse(identifier)),
                Err(ResolutionError::NotFound(_))
            ),
            "'{identifier}' should not resolve"
        );
    }
}

#[test]
fn test_non_message_symbols_are_rejected() {
    let registry = common::registry();

    match resolver::resolve(
        &registry,
        &TypeIdentifier::parse("happyday.HappyDayRequest.Weather"),
    ) {
        Err(ResolutionError::NotAMessage { name, kind }) => {
            assert_eq!(name, "happyday.HappyDayRequest.Weather");
            assert_eq!(kind, "enum");
        }
        other => panic!("Expected a non-message symbol, got {other:?}"),
    }
}

#[test]
fn test_map_entries_count_as_nested_messages() {
    let registry = common::registry();

    let entry = resolver::resolve(&registry, &TypeIdentifier::parse("..ScoresEntry")).unwrap();
    assert_eq!(entry.full_name(), "happyday.HappyDayRequest.ScoresEntry");
}
