//! Matching request URLs to operations.

use oas_jsonschema_core::Oas;
use pretty_assertions::assert_eq;
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore.json");

#[test]
fn test_literal_path_beats_template() {
    let oas = Oas::from_json(PETSTORE).unwrap();
    let found = oas
        .find_operation("https://eu.petstore.example.com/v1/pets/mine", "get")
        .unwrap();
    assert_eq!(found.non_normalized_path, "/pets/mine");
    assert_eq!(found.origin, "https://eu.petstore.example.com/v1");
    assert!(found.slugs.is_empty());
}

#[test]
fn test_slugs_bound_from_url() {
    let oas = Oas::from_json(PETSTORE).unwrap();
    let found = oas
        .find_operation("https://us.petstore.example.com/v1/pets/12?verbose=true", "PUT")
        .unwrap();
    assert_eq!(found.path, "/pets/:petId");
    assert_eq!(found.non_normalized_path, "/pets/{petId}");
    assert_eq!(found.method, "put");
    assert_eq!(found.slugs.get(":petId").map(String::as_str), Some("12"));

    let serialized = serde_json::to_value(&found).unwrap();
    assert_eq!(serialized["nonNormalizedPath"], "/pets/{petId}");
    assert_eq!(serialized["slugs"], json!({ ":petId": "12" }));
}

#[test]
fn test_no_match() {
    let oas = Oas::from_json(PETSTORE).unwrap();
    assert!(oas
        .find_operation("https://us.petstore.example.com/v2/pets", "get")
        .is_none());
    assert!(oas
        .find_operation("https://us.petstore.example.com/v1/pets", "patch")
        .is_none());
}

#[test]
fn test_swagger_host_server() {
    let oas = Oas::new(json!({
        "swagger": "2.0",
        "host": "api.example.com",
        "basePath": "/v2",
        "schemes": ["https"],
        "paths": { "/users/{id}": { "get": {} } }
    }));
    let found = oas
        .find_operation("https://api.example.com/v2/users/abc", "get")
        .unwrap();
    assert_eq!(found.slugs.get(":id").map(String::as_str), Some("abc"));
}
