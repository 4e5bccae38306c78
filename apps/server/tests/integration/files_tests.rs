//! Tests for serving stored files through their access URLs.

use actix_web::http::header;
use actix_web::test;
use model_convert_lib::services::{FileRepository, FileStore};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_converted_model_is_served_at_its_url() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "chair.usdz",
                data: b"glb-payload",
            },
            Part::Text {
                name: "filename",
                value: "42",
            },
        ],
    )
    .await;
    assert_eq!(status, 200);

    let url = body["glbUrl"].as_str().unwrap();
    let path = url.strip_prefix("http://api.example.com").unwrap();
    assert_eq!(path, "/model/bucket/models/42.glb");

    let req = test::TestRequest::get().uri(path).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "model/gltf-binary"
    );
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"glb-payload");
}

#[actix_rt::test]
async fn test_image_is_served_from_nested_subfolder() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let source = env.images_dir().join("source.png");
    std::fs::write(&source, b"\x89PNG-data").unwrap();

    let repository = FileRepository::new(&env.config.storage);
    let url = repository
        .store(&source, "products", "p1.png")
        .await
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://api.example.com/image/bucket/products/p1.png"
    );
    assert!(env.images_dir().join("products").join("p1.png").exists());

    let req = test::TestRequest::get()
        .uri("/image/bucket/products/p1.png")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&test::read_body(resp).await[..], b"\x89PNG-data");
}

#[actix_rt::test]
async fn test_image_content_type_comes_from_extension() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let source = env.images_dir().join("source.bmp");
    std::fs::write(&source, b"BM-data").unwrap();

    let repository = FileRepository::new(&env.config.storage);
    repository.store(&source, "scans", "s1.bmp").await.unwrap();

    let req = test::TestRequest::get()
        .uri("/image/bucket/scans/s1.bmp")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/bmp");
}

#[actix_rt::test]
async fn test_missing_file_is_not_found() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let req = test::TestRequest::get()
        .uri("/model/bucket/models/absent.glb")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("absent.glb"));
}

#[actix_rt::test]
async fn test_route_must_match_subfolder_kind() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let source = env.models_dir().join("seed.glb");
    std::fs::write(&source, b"glb").unwrap();

    let req = test::TestRequest::get()
        .uri("/image/bucket/models/seed.glb")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);

    let req = test::TestRequest::get()
        .uri("/model/bucket/photos/seed.glb")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);

    let req = test::TestRequest::get()
        .uri("/model/bucket/models/seed.glb")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 200);
}

#[actix_rt::test]
async fn test_deleted_file_is_no_longer_served() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    std::fs::write(env.models_dir().join("old.glb"), b"glb").unwrap();
    let repository = FileRepository::new(&env.config.storage);

    assert!(repository.delete("models", "old.glb").await.unwrap());
    assert!(repository.delete("models", "old.glb").await.unwrap());

    let req = test::TestRequest::get()
        .uri("/model/bucket/models/old.glb")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);
}
