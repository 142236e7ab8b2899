use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use velocitrack::data::model::{AuthorBibref, VelocityModel1D, VelocityModel3D, WaveType};
use velocitrack::data::store::Tables;
use velocitrack::format::HeaderStyle;
use velocitrack::server::{create_router, AppState};
use velocitrack::Catalog;

const DEPTHS: [f64; 8] = [-3.0, 0.0, 4.0, 7.2, 8.2, 10.4, 15.0, 30.0];
const VELOCITIES: [f64; 8] = [4.80, 4.80, 5.20, 5.80, 6.10, 6.30, 6.50, 7.00];

fn tables() -> Tables {
    let mut t = Tables::default();
    t.insert_1d(DEPTHS.iter().zip(VELOCITIES).map(|(&depth, velocity)| VelocityModel1D {
        depth,
        velocity,
        wave_type: WaveType::Vp,
        nfo: "TEST_NFO".into(),
        author: "test_1d".into(),
    }));
    t.insert_3d(
        WaveType::Vs,
        [0.5, 1.0, 1.0, 1.0, 1.0].iter().enumerate().map(|(i, &r)| VelocityModel3D {
            longitude: 7.0 + i as f64 * 0.5,
            latitude: 46.0,
            depth: 10.0,
            velocity: 3.4,
            r,
            nfo: "TEST_NFO".into(),
            author: "test_3d".into(),
        }),
    );
    t.upsert_bibrefs(vec![AuthorBibref {
        author: "test_1d".into(),
        bibref: "Test_1D_Reference".into(),
    }]);
    t
}

fn app(header_style: HeaderStyle) -> axum::Router {
    create_router(AppState {
        catalog: Arc::new(Catalog::new(tables())),
        header_style,
    })
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn one_d_velest_with_reference_header() {
    let (status, body) = get(app(HeaderStyle::Reference), "/1d/?author=test_1d&nfo=TEST").await;
    assert_eq!(status, StatusCode::OK);
    let expected = "\
1D TEST_NFO Test_1D_Reference
 8        vel,depth,vdamp,phase (f5.2,5x,f7.2,2x,f7.3,3x,a1)
 4.80       -3.00   001.000           P-VELOCITY MODEL
 4.80        0.00   001.000
 5.20        4.00   001.000
 5.80        7.20   001.000
 6.10        8.20   001.000
 6.30       10.40   001.000
 6.50       15.00   001.000
 7.00       30.00   001.000";
    assert_eq!(body, expected);
}

#[tokio::test]
async fn one_d_default_header_echoes_request() {
    let (_, body) = get(app(HeaderStyle::Request), "/1d?author=test&nfo=TEST").await;
    assert!(body.starts_with("test model - TEST\n"));
    assert!(!body.contains("S-VELOCITY MODEL"));
}

#[tokio::test]
async fn one_d_pagination_banner() {
    let (status, body) = get(
        app(HeaderStyle::Request),
        "/1d/?author=test_1d&nfo=TEST&limit=3&offset=2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[1], "# Showing 3-5 of 8 records (limit=3, offset=2)");
    assert_eq!(lines[3], " 5.20        4.00   001.000           P-VELOCITY MODEL");
    assert_eq!(lines.len(), 6);
}

#[tokio::test]
async fn three_d_vs_with_r() {
    let (status, body) = get(
        app(HeaderStyle::Request),
        "/3d/?wave_type=VS&author=test_3d&include_r=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "test_3d model - ");
    assert_eq!(lines[1], "Longitude|Latitude|Depth|Vs|R");
    assert_eq!(&lines[2..], &[
        "7.0|46.0|10.0|3.4|0.5",
        "7.5|46.0|10.0|3.4|1.0",
        "8.0|46.0|10.0|3.4|1.0",
        "8.5|46.0|10.0|3.4|1.0",
        "9.0|46.0|10.0|3.4|1.0",
    ]);
}

#[tokio::test]
async fn three_d_without_include_r_hides_column() {
    let (_, body) = get(app(HeaderStyle::Request), "/3d/?wave_type=VS&author=test_3d").await;
    assert!(body.contains("\nLongitude|Latitude|Depth|Vs\n7.0|46.0|10.0|3.4\n"));
}

#[tokio::test]
async fn not_found_is_404_with_detail() {
    let (status, body) = get(app(HeaderStyle::Request), "/3d/?wave_type=VP&author=test_3d").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"detail":"No VP data found for author: test_3d"}"#);
}

#[tokio::test]
async fn offset_past_end_is_400() {
    let (status, body) = get(
        app(HeaderStyle::Request),
        "/1d/?author=test_1d&nfo=TEST&offset=8",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"detail":"Offset 8 exceeds total records (8). Max offset: 7"}"#
    );
}

#[tokio::test]
async fn out_of_range_parameters_are_422() {
    for uri in [
        "/1d/?author=test_1d&nfo=TEST&limit=0",
        "/1d/?author=test_1d&nfo=TEST&limit=100001",
        "/1d/?author=test_1d&nfo=TEST&offset=-1",
        "/3d/?wave_type=XX&author=test_3d",
        "/1d/?author=test_1d",
    ] {
        let (status, body) = get(app(HeaderStyle::Request), uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert!(body.starts_with(r#"{"detail":"#), "{uri}: {body}");
    }
}

#[tokio::test]
async fn discovery_lists_are_stable() {
    let (status, first) = get(app(HeaderStyle::Request), "/authors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, "test_1d\ntest_3d\n");
    let (_, second) = get(app(HeaderStyle::Request), "/authors").await;
    assert_eq!(first, second);

    let (_, nfos) = get(app(HeaderStyle::Request), "/nfos").await;
    assert_eq!(nfos, "TEST_NFO\n");
}

#[tokio::test]
async fn root_reports_service_and_version() {
    let (status, body) = get(app(HeaderStyle::Request), "/").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["service"], "VelociTrack API");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
