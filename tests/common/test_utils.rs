use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use krishi_advisor::{
    AdvisorClient,
    client::{FarmerProfile, ImageInput},
    config::ClientConfig,
};
use std::io::Cursor;
use tempfile::TempDir;
use wiremock::{MockServer, Request};

/// Client configuration pointed at a mock server with a short timeout.
pub fn create_test_client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        timeout_secs: 2,
        jpeg_quality: 90,
        session_id: "test-session".to_string(),
        api_base_url: None,
    }
}

pub fn create_test_client(server: &MockServer) -> AdvisorClient {
    AdvisorClient::new(&create_test_client_config(&server.uri()))
        .expect("Failed to create advisor client")
}

/// A client whose host refuses connections.
pub fn create_unreachable_client() -> AdvisorClient {
    AdvisorClient::new(&create_test_client_config("http://127.0.0.1:1"))
        .expect("Failed to create advisor client")
}

/// A small solid-green RGB leaf image.
pub fn create_rgb_input() -> ImageInput {
    ImageInput::Rgb8 {
        width: 8,
        height: 8,
        pixels: [34u8, 139, 34].repeat(64),
    }
}

pub fn create_png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(6, 6, Rgb([90, 160, 40]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("Failed to encode PNG");
    png
}

pub fn create_farmer_profile(land_holding: f64) -> FarmerProfile {
    FarmerProfile {
        farmer_id: "F001".to_string(),
        name: "Ramesh Patil".to_string(),
        age: 45,
        gender: "male".to_string(),
        category: "general".to_string(),
        land_holding,
        annual_income: 150_000.0,
        location: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        district: "Pune".to_string(),
        village: "Wagholi".to_string(),
        education_level: "secondary".to_string(),
        farming_experience: 20,
        primary_crops: vec!["wheat".to_string(), "onion".to_string()],
        has_kisan_card: true,
        has_aadhaar: true,
        has_bank_account: true,
        is_marginal_farmer: None,
        is_small_farmer: None,
    }
}

pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub async fn create_test_config_file(dir: &TempDir, content: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    tokio::fs::write(&config_path, content)
        .await
        .expect("Failed to write config file");
    config_path.to_string_lossy().to_string()
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Extracts the bytes of the first multipart part named `name`.
pub fn multipart_part<'a>(body: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let marker = format!("name=\"{}\"", name);
    let start = body
        .windows(marker.len())
        .position(|w| w == marker.as_bytes())?;
    let after_headers = start
        + body[start..]
            .windows(4)
            .position(|w| w == b"\r\n\r\n")?
        + 4;
    let end = after_headers
        + body[after_headers..]
            .windows(4)
            .position(|w| w == b"\r\n--")?;
    Some(&body[after_headers..end])
}

pub const SAMPLE_CONFIG_YAML: &str = r#"
client:
  base_url: "http://10.0.2.2:8000"
  timeout_secs: 15
  jpeg_quality: 85
  session_id: "farmer-7"
logs:
  level: "debug"
"#;

pub const INVALID_CONFIG_YAML: &str = r#"
client:
  base_url: "http://localhost:8000"
  timeout_secs: "soon"
"#;

pub const OUT_OF_RANGE_CONFIG_YAML: &str = r#"
client:
  jpeg_quality: 150
"#;
