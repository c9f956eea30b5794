
use reqwest::{multipart, StatusCode};
use serde_json::Value;
use test_utils::*;

#[actix_rt::test]
async fn full_sighting_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let response = app
        .upload(&token, sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Image and location data uploaded successfully");
    let created = &body["animalImage"];
    assert_eq!(created["animalName"], "Deer");
    assert_eq!(created["location"]["latitude"], 12.34);
    assert_eq!(created["location"]["longitude"], 56.78);
    assert_eq!(created["time"], "2024-01-01T10:00:00Z");
    assert!(created.get("storageKey").is_none());

    let image_url = created["image"].as_str().unwrap();
    assert!(image_url.starts_with(&format!("{}/uploads/", app.address)));
    let image = app.client.get(image_url).send().await.unwrap();
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()["content-type"], "image/jpeg");
    assert_eq!(image.bytes().await.unwrap().as_ref(), JPEG_BYTES.as_slice());

    let listed: Vec<Value> = app.list(&token).await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);

    let id = created["id"].as_str().unwrap();
    let response = app.delete(&token, id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Image deleted successfully");

    let listed: Vec<Value> = app.list(&token).await.json().await.unwrap();
    assert!(listed.is_empty());
}

#[actix_rt::test]
async fn alias_routes_reach_the_same_records() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let response = app.client
        .post(format!("{}/animal-images/upload", app.address))
        .bearer_auth(&token)
        .multipart(sighting_form("Fox", "2024-03-05T06:30:00Z", "-33.9", "18.4"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let listed: Vec<Value> = app.client
        .get(format!("{}/animal-images/", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["animalName"], "Fox");
}

#[actix_rt::test]
async fn non_numeric_latitude_is_rejected_without_a_record() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let response = app
        .upload(&token, sighting_form("Deer", "2024-01-01T10:00", "abc", "56.78"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "latitude");
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn missing_fields_are_listed_in_order() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let form = multipart::Form::new().text("animalName", "Deer");
    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["time", "latitude", "longitude", "image"]);
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn out_of_range_coordinates_are_rejected() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let response = app
        .upload(&token, sighting_form("Deer", "2024-01-01T10:00", "91", "181"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn unsupported_file_type_is_415() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let form = multipart::Form::new()
        .text("animalName", "Deer")
        .text("time", "2024-01-01T10:00")
        .text("latitude", "12.34")
        .text("longitude", "56.78")
        .part("image", image_part(b"hello".to_vec(), "notes.txt", "text/plain"));
    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Only JPEG, PNG, and GIF formats are allowed");
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn non_multipart_body_is_415() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let response = app.client
        .post(format!("{}/data/upload", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "animalName": "Deer" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[actix_rt::test]
async fn oversize_image_is_413() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let mut bytes = JPEG_BYTES.to_vec();
    bytes.resize(app.config.max_upload_bytes + 1, 0);
    let form = multipart::Form::new()
        .text("animalName", "Deer")
        .text("time", "2024-01-01T10:00")
        .text("latitude", "12.34")
        .text("longitude", "56.78")
        .part("image", image_part(bytes, "deer.jpg", "image/jpeg"));
    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn body_over_the_multipart_ceiling_is_413() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let mut bytes = JPEG_BYTES.to_vec();
    bytes.resize(app.config.max_upload_bytes + 200 * 1024, 0);
    let form = multipart::Form::new()
        .text("animalName", "Deer")
        .text("time", "2024-01-01T10:00")
        .text("latitude", "12.34")
        .text("longitude", "56.78")
        .part("image", image_part(bytes, "deer.jpg", "image/jpeg"));
    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "payload_too_large");
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn overlong_animal_name_is_rejected_before_storage() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let name = "x".repeat(256);
    let response = app
        .upload(&token, sighting_form(&name, "2024-01-01T10:00", "12.34", "56.78"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "animalName");
    assert_eq!(app.sightings.count(), 0);
    assert_eq!(std::fs::read_dir(app.upload_dir.path()).unwrap().count(), 0);
}

#[actix_rt::test]
async fn upload_requires_a_token() {
    let app = TestApp::spawn().await;

    let response = app.client
        .post(format!("{}/data/upload", app.address))
        .multipart(sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.sightings.count(), 0);
}

#[actix_rt::test]
async fn users_only_see_their_own_sightings() {
    let app = TestApp::spawn().await;
    let alice = app.signed_in_user("alice").await;
    let bob = app.signed_in_user("bob").await;

    app.upload(&alice, sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78")).await;
    app.upload(&bob, sighting_form("Owl", "2024-01-02T22:15", "40.0", "-3.7")).await;

    let alice_list: Vec<Value> = app.list(&alice).await.json().await.unwrap();
    let bob_list: Vec<Value> = app.list(&bob).await.json().await.unwrap();

    assert_eq!(alice_list.len(), 1);
    assert_eq!(alice_list[0]["animalName"], "Deer");
    assert_eq!(bob_list.len(), 1);
    assert_eq!(bob_list[0]["animalName"], "Owl");
}

#[actix_rt::test]
async fn deleting_someone_elses_sighting_is_forbidden() {
    let app = TestApp::spawn().await;
    let alice = app.signed_in_user("alice").await;
    let bob = app.signed_in_user("bob").await;

    let body: Value = app
        .upload(&alice, sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78"))
        .await
        .json()
        .await
        .unwrap();
    let id = body["animalImage"]["id"].as_str().unwrap();

    let response = app.delete(&bob, id).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let alice_list: Vec<Value> = app.list(&alice).await.json().await.unwrap();
    assert_eq!(alice_list.len(), 1);
}

#[actix_rt::test]
async fn deleting_twice_is_not_found_the_second_time() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let body: Value = app
        .upload(&token, sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78"))
        .await
        .json()
        .await
        .unwrap();
    let id = body["animalImage"]["id"].as_str().unwrap();

    assert_eq!(app.delete(&token, id).await.status(), StatusCode::OK);
    assert_eq!(app.delete(&token, id).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn unknown_upload_key_is_not_found() {
    let app = TestApp::spawn().await;

    let missing = app.client
        .get(format!("{}/uploads/{}.jpg", app.address, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    let bogus = app.client
        .get(format!("{}/uploads/secret.txt", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(bogus.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn duplicated_field_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("alice").await;

    let form = sighting_form("Deer", "2024-01-01T10:00", "12.34", "56.78")
        .text("latitude", "13.0");
    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.sightings.count(), 0);
}
