//! Tests for `POST /convert`.

use serde_json::json;

use super::test_helpers::*;

const USDZ_BYTES: &[u8] = b"PK\x03\x04usdz-scene-bytes";

/// chair.usdz with filename=42 ends up as models/42.glb.
#[actix_rt::test]
async fn test_convert_with_desired_filename() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "chair.usdz",
                data: USDZ_BYTES,
            },
            Part::Text {
                name: "filename",
                value: "42",
            },
        ],
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(
        body,
        json!({ "glbUrl": "http://api.example.com/model/bucket/models/42.glb" })
    );
    assert_eq!(
        std::fs::read(env.models_dir().join("42.glb")).unwrap(),
        USDZ_BYTES
    );
    env.assert_no_scratch_files();
}

/// The filename field may arrive before the file part.
#[actix_rt::test]
async fn test_convert_with_filename_before_file() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::Text {
                name: "filename",
                value: "sku-991",
            },
            Part::File {
                name: "modelFile",
                filename: "lamp.usdz",
                data: USDZ_BYTES,
            },
        ],
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(
        body["glbUrl"],
        "http://api.example.com/model/bucket/models/sku-991.glb"
    );
    assert!(env.models_dir().join("sku-991.glb").exists());
}

/// Without a filename field the original name minus extension is used.
#[actix_rt::test]
async fn test_convert_defaults_to_original_stem() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::File {
            name: "modelFile",
            filename: "armchair.usdz",
            data: USDZ_BYTES,
        }],
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(
        body["glbUrl"],
        "http://api.example.com/model/bucket/models/armchair.glb"
    );
    assert!(env.models_dir().join("armchair.glb").exists());
    env.assert_no_scratch_files();
}

/// Storing twice under the same name keeps the latest upload.
#[actix_rt::test]
async fn test_convert_overwrites_existing_model() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    for data in [&b"first"[..], &b"second"[..]] {
        let (status, _) = post_convert(
            &app,
            &[
                Part::File {
                    name: "modelFile",
                    filename: "chair.usdz",
                    data,
                },
                Part::Text {
                    name: "filename",
                    value: "42",
                },
            ],
        )
        .await;
        assert_eq!(status, 200);
    }

    assert_eq!(std::fs::read(env.models_dir().join("42.glb")).unwrap(), b"second");
}

#[actix_rt::test]
async fn test_missing_model_file_is_bad_request() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::Text {
            name: "filename",
            value: "42",
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No modelFile provided" }));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_file_under_wrong_field_is_bad_request() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::File {
            name: "model",
            filename: "chair.usdz",
            data: USDZ_BYTES,
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "No modelFile provided");
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_converter_failure_reports_stderr() {
    let env = TestEnv::new(r#"echo "Blender: cannot import USD stage" >&2; exit 1"#);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::File {
            name: "modelFile",
            filename: "broken.usdz",
            data: USDZ_BYTES,
        }],
    )
    .await;

    assert_eq!(status, 500);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("cannot import USD stage"), "{}", message);
    assert!(!env.models_dir().join("broken.glb").exists());
    env.assert_no_scratch_files();
}

/// A clean exit without the expected output must never be a 200.
#[actix_rt::test]
async fn test_converter_success_without_output_fails() {
    let env = TestEnv::new("exit 0");
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "chair.usdz",
                data: USDZ_BYTES,
            },
            Part::Text {
                name: "filename",
                value: "42",
            },
        ],
    )
    .await;

    assert_eq!(status, 500);
    assert!(
        body["error"].as_str().unwrap().contains("not created"),
        "{}",
        body
    );
    assert!(!env.models_dir().join("42.glb").exists());
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_traversal_filename_is_rejected() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "chair.usdz",
                data: USDZ_BYTES,
            },
            Part::Text {
                name: "filename",
                value: "../../escape",
            },
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("Invalid filename"));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_oversized_upload_is_rejected() {
    let env = TestEnv::with_max_upload_size(COPY_CONVERTER, 16);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::File {
            name: "modelFile",
            filename: "huge.usdz",
            data: &[0u8; 64],
        }],
    )
    .await;

    assert_eq!(status, 413);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_second_model_file_is_rejected() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "a.usdz",
                data: USDZ_BYTES,
            },
            Part::File {
                name: "modelFile",
                filename: "b.usdz",
                data: USDZ_BYTES,
            },
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("Only one modelFile"));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_json_request_reports_missing_model_file() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let req = actix_web::test::TestRequest::post()
        .uri("/convert")
        .set_json(json!({ "filename": "42" }))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "No modelFile provided" }));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_bodyless_request_reports_missing_model_file() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let req = actix_web::test::TestRequest::post().uri("/convert").to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "No modelFile provided" }));
}

/// A browser submits an empty file part when no file was chosen.
#[actix_rt::test]
async fn test_model_file_without_filename_is_ignored() {
    let env = TestEnv::new("test -s \"$0\" || { echo 'empty input' >&2; exit 1; }; cp \"$0\" \"$1\"");
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "",
                data: b"",
            },
            Part::Text {
                name: "filename",
                value: "42",
            },
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No modelFile provided" }));
    assert!(!env.models_dir().join("42.glb").exists());
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_model_file_as_text_field_is_ignored() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[Part::Text {
            name: "modelFile",
            value: "not-a-file",
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No modelFile provided" }));
    env.assert_no_scratch_files();
}

#[actix_rt::test]
async fn test_inner_double_dots_in_filename_are_kept() {
    let env = TestEnv::new(COPY_CONVERTER);
    let app = env.app().await;

    let (status, body) = post_convert(
        &app,
        &[
            Part::File {
                name: "modelFile",
                filename: "chair.usdz",
                data: USDZ_BYTES,
            },
            Part::Text {
                name: "filename",
                value: "v1..2",
            },
        ],
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "glbUrl": "http://api.example.com/model/bucket/models/v1..2.glb" })
    );
    assert!(env.models_dir().join("v1..2.glb").exists());
    env.assert_no_scratch_files();
}
