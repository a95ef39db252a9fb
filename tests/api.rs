use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use student_result_predictor::api::{self, AppState};
use student_result_predictor::data::built_in_samples;
use student_result_predictor::{build_kernel, KernelConfig};

fn state() -> web::Data<AppState> {
    let samples = built_in_samples();
    let kernel = build_kernel(&samples, KernelConfig::default()).unwrap();
    web::Data::new(AppState {
        kernel,
        samples,
        data_source: "built-in sample".to_string(),
        loaded_from_cache: false,
    })
}

#[actix_web::test]
async fn test_predict_accepts_numbers_and_text() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"study_hours": 8, "attendance": "85"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["verdict"], "PASS");
    assert_eq!(body["recommendation"]["label"], "Excellent");
    assert!(body["probability_percent"].as_str().unwrap().ends_with('%'));
    assert!(body["marks_display"].as_str().unwrap().ends_with("/ 100"));
}

#[actix_web::test]
async fn test_predict_rejects_non_numeric_input() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"study_hours": "lots", "attendance": 85}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("study_hours"));
}

#[actix_web::test]
async fn test_predict_rejects_malformed_body() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"attendance": 85}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_batch_predict_reports_bad_rows() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/batch-predict")
        .set_json(json!([
            {"name": "Jane Smith", "hours": 9.0, "attendance": 92.0},
            {"name": "Mike Johnson", "study_hours": 1.0, "attendance": 40.0},
            {"name": "Sarah Williams", "study_hours": 3.0, "attendance": 140.0}
        ]))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total_students"], 3);
    assert_eq!(body["predictions"][0]["prediction"]["verdict"], "PASS");
    assert_eq!(body["predictions"][1]["prediction"]["verdict"], "FAIL");
    assert!(body["predictions"][2]["error"]
        .as_str()
        .unwrap()
        .contains("attendance"));
    assert_eq!(body["summary"]["pass_count"], 1);
    assert_eq!(body["summary"]["fail_count"], 1);
}

#[actix_web::test]
async fn test_model_info_and_analytics() {
    let app = test::init_service(App::new().app_data(state()).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/model/info").to_request();
    let info: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(info["policy"], "hybrid");
    assert_eq!(info["evaluation"]["training_samples"], 10);
    assert_eq!(info["loaded_from_cache"], false);
    assert_eq!(info["recommendation_bands"], json!(["Excellent", "Safe", "Warning"]));

    let req = test::TestRequest::get().uri("/analytics").to_request();
    let analytics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(analytics["total_students"], 10);
    assert_eq!(analytics["performance_breakdown"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_health_check() {
    let app = test::init_service(App::new().configure(api::configure)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
